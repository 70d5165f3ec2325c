//! Per-tax-year thresholds and rates.
//!
//! A table is plain data. It is built explicitly (either the built-in year or a
//! JSON document) and passed to every evaluation, so several years can be held
//! side by side.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThresholdError {
    #[error("failed to read threshold table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid threshold table JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("income tax schedule has no bands")]
    NoBands,

    #[error("first income tax band must start at 0, found {0}")]
    FirstBandNotZero(f64),

    #[error("income tax band {index} must start where band {previous} ends")]
    NonContiguous { index: usize, previous: usize },

    #[error("income tax band {0} is empty or inverted")]
    EmptyBand(usize),

    #[error("only the last income tax band may be unbounded (band {0})")]
    UnboundedBeforeLast(usize),

    #[error("the last income tax band must be unbounded")]
    BoundedLastBand,

    #[error("{name} must be between 0 and 1, found {rate}")]
    RateOutOfRange { name: String, rate: f64 },

    #[error("{name} must be finite and >= 0, found {value}")]
    InvalidAmount { name: &'static str, value: f64 },

    #[error("allowance taper divisor must be > 0")]
    TaperDivisor,

    #[error("contribution upper limit must be >= primary threshold")]
    ContributionRange,

    #[error("benefit charge end must be > charge start")]
    ChargeRange,

    #[error("stepped withdrawal increment must be > 0")]
    WithdrawalIncrement,
}

/// One slice of a progressive schedule; `upper: None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub lower: f64,
    pub upper: Option<f64>,
    pub rate: f64,
}

impl Band {
    pub fn span(&self) -> f64 {
        self.upper.map_or(f64::INFINITY, |upper| upper - self.lower)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionThresholds {
    pub primary_threshold: f64,
    pub upper_limit: f64,
    pub main_rate: f64,
    pub additional_rate: f64,
}

/// How the high-income benefit charge withdraws entitlement between the
/// charge start and end thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WithdrawalPolicy {
    /// Fraction of the way through the withdrawal range.
    #[default]
    Linear,
    /// One percentage point per whole `increment` above the start, capped at 100.
    Stepped { increment: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyBenefitThresholds {
    pub first_dependent_weekly: f64,
    pub additional_dependent_weekly: f64,
    pub weeks_per_year: f64,
    pub charge_start: f64,
    pub charge_end: f64,
    #[serde(default)]
    pub withdrawal_policy: WithdrawalPolicy,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdTable {
    pub tax_year: String,
    pub personal_allowance: f64,
    pub allowance_taper_start: f64,
    /// Income above the taper start that costs one unit of allowance.
    pub allowance_taper_loss_per: f64,
    /// Applied to taxable income after the allowance has been deducted.
    pub income_tax_bands: Vec<Band>,
    pub contribution: ContributionThresholds,
    pub family_benefit: FamilyBenefitThresholds,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::uk_2025_26()
    }
}

impl ThresholdTable {
    /// UK figures assumed for 2025/26.
    pub fn uk_2025_26() -> Self {
        let personal_allowance = 12_570.0;
        let higher_rate_ceiling = 125_140.0 - personal_allowance;
        Self {
            tax_year: "2025/26 (assumed)".to_string(),
            personal_allowance,
            allowance_taper_start: 100_000.0,
            allowance_taper_loss_per: 2.0,
            income_tax_bands: vec![
                Band {
                    lower: 0.0,
                    upper: Some(37_700.0),
                    rate: 0.20,
                },
                Band {
                    lower: 37_700.0,
                    upper: Some(higher_rate_ceiling),
                    rate: 0.40,
                },
                Band {
                    lower: higher_rate_ceiling,
                    upper: None,
                    rate: 0.45,
                },
            ],
            contribution: ContributionThresholds {
                primary_threshold: 12_570.0,
                upper_limit: 50_270.0,
                main_rate: 0.08,
                additional_rate: 0.02,
            },
            family_benefit: FamilyBenefitThresholds {
                first_dependent_weekly: 25.60,
                additional_dependent_weekly: 16.95,
                weeks_per_year: 52.0,
                charge_start: 60_000.0,
                charge_end: 80_000.0,
                withdrawal_policy: WithdrawalPolicy::Linear,
            },
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ThresholdError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ThresholdError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ThresholdError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Income at which the tapered allowance first reaches zero.
    pub fn allowance_exhausted_at(&self) -> f64 {
        self.allowance_taper_start + self.personal_allowance * self.allowance_taper_loss_per
    }

    /// The contribution schedule as two explicit bands. There is no band below
    /// the primary threshold.
    pub fn contribution_bands(&self) -> [Band; 2] {
        let c = &self.contribution;
        [
            Band {
                lower: c.primary_threshold,
                upper: Some(c.upper_limit),
                rate: c.main_rate,
            },
            Band {
                lower: c.upper_limit,
                upper: None,
                rate: c.additional_rate,
            },
        ]
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        let fb = &self.family_benefit;
        let c = &self.contribution;
        for (name, value) in [
            ("personalAllowance", self.personal_allowance),
            ("allowanceTaperStart", self.allowance_taper_start),
            ("primaryThreshold", c.primary_threshold),
            ("upperLimit", c.upper_limit),
            ("firstDependentWeekly", fb.first_dependent_weekly),
            ("additionalDependentWeekly", fb.additional_dependent_weekly),
            ("weeksPerYear", fb.weeks_per_year),
            ("chargeStart", fb.charge_start),
            ("chargeEnd", fb.charge_end),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ThresholdError::InvalidAmount { name, value });
            }
        }

        if !(self.allowance_taper_loss_per.is_finite() && self.allowance_taper_loss_per > 0.0) {
            return Err(ThresholdError::TaperDivisor);
        }
        if c.upper_limit < c.primary_threshold {
            return Err(ThresholdError::ContributionRange);
        }
        if fb.charge_end <= fb.charge_start {
            return Err(ThresholdError::ChargeRange);
        }
        if let WithdrawalPolicy::Stepped { increment } = fb.withdrawal_policy {
            if !(increment.is_finite() && increment > 0.0) {
                return Err(ThresholdError::WithdrawalIncrement);
            }
        }

        check_rate("contribution mainRate", c.main_rate)?;
        check_rate("contribution additionalRate", c.additional_rate)?;
        self.validate_bands()
    }

    fn validate_bands(&self) -> Result<(), ThresholdError> {
        let bands = &self.income_tax_bands;
        let Some(first) = bands.first() else {
            return Err(ThresholdError::NoBands);
        };
        if first.lower != 0.0 {
            return Err(ThresholdError::FirstBandNotZero(first.lower));
        }

        let last = bands.len() - 1;
        for (index, band) in bands.iter().enumerate() {
            check_rate(&format!("income tax band {index} rate"), band.rate)?;
            match band.upper {
                None if index != last => return Err(ThresholdError::UnboundedBeforeLast(index)),
                Some(_) if index == last => return Err(ThresholdError::BoundedLastBand),
                Some(upper) if upper.is_nan() || upper <= band.lower => {
                    return Err(ThresholdError::EmptyBand(index));
                }
                _ => {}
            }
            if index > 0 && bands[index - 1].upper != Some(band.lower) {
                return Err(ThresholdError::NonContiguous {
                    index,
                    previous: index - 1,
                });
            }
        }
        Ok(())
    }
}

fn check_rate(name: &str, rate: f64) -> Result<(), ThresholdError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(ThresholdError::RateOutOfRange {
            name: name.to_string(),
            rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_table_is_valid() {
        let table = ThresholdTable::uk_2025_26();
        table.validate().expect("built-in table must validate");
        assert_eq!(table.allowance_exhausted_at(), 125_140.0);
    }

    #[test]
    fn contribution_bands_start_at_primary_threshold() {
        let table = ThresholdTable::uk_2025_26();
        let [main, additional] = table.contribution_bands();
        assert_eq!(main.lower, 12_570.0);
        assert_eq!(main.upper, Some(50_270.0));
        assert_eq!(additional.lower, 50_270.0);
        assert!(additional.span().is_infinite());
    }

    #[test]
    fn validate_rejects_gap_between_bands() {
        let mut table = ThresholdTable::uk_2025_26();
        table.income_tax_bands[1].lower = 40_000.0;
        let err = table.validate().expect_err("gap must be rejected");
        assert!(matches!(err, ThresholdError::NonContiguous { index: 1, .. }));
    }

    #[test]
    fn validate_rejects_bounded_last_band() {
        let mut table = ThresholdTable::uk_2025_26();
        table.income_tax_bands[2].upper = Some(500_000.0);
        let err = table.validate().expect_err("bounded last band must be rejected");
        assert!(matches!(err, ThresholdError::BoundedLastBand));
    }

    #[test]
    fn validate_rejects_unbounded_middle_band() {
        let mut table = ThresholdTable::uk_2025_26();
        table.income_tax_bands[1].upper = None;
        let err = table.validate().expect_err("unbounded middle band must be rejected");
        assert!(matches!(err, ThresholdError::UnboundedBeforeLast(1)));
    }

    #[test]
    fn validate_rejects_rate_above_one() {
        let mut table = ThresholdTable::uk_2025_26();
        table.income_tax_bands[0].rate = 1.2;
        let err = table.validate().expect_err("rate above 1 must be rejected");
        assert!(err.to_string().contains("band 0"));
    }

    #[test]
    fn validate_rejects_inverted_charge_range() {
        let mut table = ThresholdTable::uk_2025_26();
        table.family_benefit.charge_end = table.family_benefit.charge_start;
        assert!(matches!(table.validate(), Err(ThresholdError::ChargeRange)));
    }

    #[test]
    fn json_round_trip_preserves_table() {
        let table = ThresholdTable::uk_2025_26();
        let json = serde_json::to_string(&table).expect("table should serialize");
        let parsed = ThresholdTable::from_json_str(&json).expect("table should parse");
        assert_eq!(parsed, table);
    }

    #[test]
    fn json_without_policy_defaults_to_linear_withdrawal() {
        let mut value = serde_json::to_value(ThresholdTable::uk_2025_26()).expect("serialize");
        value["familyBenefit"]
            .as_object_mut()
            .expect("object")
            .remove("withdrawalPolicy");
        let parsed = ThresholdTable::from_json_str(&value.to_string()).expect("parse");
        assert_eq!(
            parsed.family_benefit.withdrawal_policy,
            WithdrawalPolicy::Linear
        );
    }

    #[test]
    fn json_accepts_stepped_policy() {
        let mut value = serde_json::to_value(ThresholdTable::uk_2025_26()).expect("serialize");
        value["familyBenefit"]["withdrawalPolicy"] =
            serde_json::json!({ "kind": "stepped", "increment": 200 });
        let parsed = ThresholdTable::from_json_str(&value.to_string()).expect("parse");
        assert_eq!(
            parsed.family_benefit.withdrawal_policy,
            WithdrawalPolicy::Stepped { increment: 200.0 }
        );
    }

    #[test]
    fn shipped_stepped_table_matches_built_in_except_policy() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/thresholds/uk-2025-26-stepped.json");
        let loaded = ThresholdTable::load(path).expect("shipped table should load");
        assert_eq!(
            loaded.family_benefit.withdrawal_policy,
            WithdrawalPolicy::Stepped { increment: 200.0 }
        );

        let mut expected = ThresholdTable::uk_2025_26();
        expected.tax_year = loaded.tax_year.clone();
        expected.family_benefit.withdrawal_policy = loaded.family_benefit.withdrawal_policy;
        assert_eq!(loaded, expected);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ThresholdTable::load("does/not/exist.json").expect_err("missing file");
        assert!(matches!(err, ThresholdError::Io { .. }));
    }
}
