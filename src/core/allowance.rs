use super::thresholds::ThresholdTable;

/// Usable personal allowance for an income measured before the allowance.
///
/// The allowance loses one unit per whole `allowance_taper_loss_per` of income
/// above the taper start, so the taper is stepped rather than smooth.
pub fn personal_allowance(income_before_allowance: f64, table: &ThresholdTable) -> f64 {
    if income_before_allowance <= table.allowance_taper_start {
        return table.personal_allowance;
    }
    let excess = income_before_allowance - table.allowance_taper_start;
    let reduction = (excess / table.allowance_taper_loss_per).floor();
    (table.personal_allowance - reduction).max(0.0)
}
