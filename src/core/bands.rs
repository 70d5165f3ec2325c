use super::thresholds::Band;
use super::types::{BandBreakdown, BandResult};

/// Spreads `amount` across an ascending, contiguous band schedule.
///
/// Each band takes the slice of `amount` that falls between its bounds, so a
/// schedule whose first band starts above zero leaves the income below it
/// untaxed. Bands with no portion are omitted, and traversal stops once the
/// band containing `amount` has been charged. A NaN amount charges nothing.
pub fn evaluate_bands(amount: f64, bands: &[Band]) -> BandBreakdown {
    let mut breakdown = BandBreakdown::default();
    if amount.is_nan() {
        return breakdown;
    }

    for band in bands {
        let upper = band.upper.unwrap_or(f64::INFINITY);
        let portion = (amount.min(upper) - band.lower).max(0.0).min(band.span());
        if portion > 0.0 {
            let charged = portion * band.rate;
            breakdown.bands.push(BandResult {
                rate: band.rate,
                portion,
                amount: charged,
            });
            breakdown.total += charged;
        }
        if amount <= upper {
            break;
        }
    }

    breakdown
}
