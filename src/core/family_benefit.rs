use super::thresholds::{FamilyBenefitThresholds, WithdrawalPolicy};
use super::types::FamilyBenefitResult;

/// Annual entitlement for `dependents`: a first-dependent rate plus a lower
/// rate for each additional dependent.
pub fn entitlement(dependents: u32, thresholds: &FamilyBenefitThresholds) -> f64 {
    if dependents == 0 {
        return 0.0;
    }
    let first = thresholds.first_dependent_weekly * thresholds.weeks_per_year;
    let additional = f64::from(dependents - 1)
        * thresholds.additional_dependent_weekly
        * thresholds.weeks_per_year;
    first + additional
}

/// High-income charge on `gross_entitlement` for the given adjusted income.
pub fn charge(
    adjusted_income: f64,
    gross_entitlement: f64,
    thresholds: &FamilyBenefitThresholds,
) -> FamilyBenefitResult {
    if gross_entitlement == 0.0 {
        return FamilyBenefitResult::default();
    }

    let fraction = withdrawn_fraction(adjusted_income, thresholds);
    let charge = gross_entitlement * fraction;
    FamilyBenefitResult {
        gross: gross_entitlement,
        charge,
        net: gross_entitlement - charge,
        withdrawn_percent: fraction * 100.0,
    }
}

fn withdrawn_fraction(adjusted_income: f64, thresholds: &FamilyBenefitThresholds) -> f64 {
    let start = thresholds.charge_start;
    let end = thresholds.charge_end;
    if adjusted_income <= start {
        return 0.0;
    }

    // The stepped policy ignores `end`; only the 100-point cap bounds it.
    let excess = adjusted_income - start;
    match thresholds.withdrawal_policy {
        WithdrawalPolicy::Linear if adjusted_income >= end => 1.0,
        WithdrawalPolicy::Linear => (excess / (end - start)).clamp(0.0, 1.0),
        WithdrawalPolicy::Stepped { increment } => {
            ((excess / increment).floor() / 100.0).clamp(0.0, 1.0)
        }
    }
}
