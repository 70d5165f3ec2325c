use serde::Deserialize;

use crate::core::{Inputs, PensionMode};

pub(crate) const MAX_SWEEP_POINTS: usize = 500;

/// Wire form of `Inputs`. Keys are camelCase, and the older names
/// (`pensionEmployee`, `salarySacrifice`, `children`) are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct InputsPayload {
    pub(crate) salary: Option<f64>,
    pub(crate) bonus: Option<f64>,
    #[serde(alias = "pensionEmployee", alias = "pension_employee")]
    pub(crate) pension: Option<f64>,
    #[serde(alias = "pension_is_percent")]
    pub(crate) pension_is_percent: Option<bool>,
    #[serde(alias = "salarySacrifice", alias = "salary_sacrifice")]
    pub(crate) salary_exchange: Option<f64>,
    #[serde(alias = "children")]
    pub(crate) dependents: Option<u32>,
    pub(crate) partner_income: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ComparePayload {
    #[serde(flatten)]
    pub(crate) inputs: InputsPayload,
    #[serde(alias = "newPension")]
    pub(crate) new_pension_value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SweepPayload {
    #[serde(flatten)]
    pub(crate) inputs: InputsPayload,
    pub(crate) pension_amounts: Vec<f64>,
}

/// Validates a payload and fills in defaults. The engine itself accepts any
/// numbers; requests are held to non-negative, finite amounts here.
pub(crate) fn build_inputs(payload: InputsPayload) -> Result<Inputs, String> {
    let pension_mode = if payload.pension_is_percent.unwrap_or(false) {
        PensionMode::Percent
    } else {
        PensionMode::Amount
    };

    let salary = amount("salary", payload.salary)?;
    let bonus = amount("bonus", payload.bonus)?;
    let pension = amount("pension", payload.pension)?;
    let salary_exchange = amount("salaryExchange", payload.salary_exchange)?;

    if pension_mode == PensionMode::Percent && pension > 100.0 {
        return Err("pension must be between 0 and 100 when pensionIsPercent is set".to_string());
    }

    let partner_income = match payload.partner_income {
        Some(value) => Some(amount("partnerIncome", Some(value))?),
        None => None,
    };

    Ok(Inputs {
        salary,
        bonus,
        pension,
        pension_mode,
        salary_exchange,
        dependents: payload.dependents.unwrap_or(0),
        partner_income,
    })
}

pub(crate) fn check_new_pension_value(value: f64, mode: PensionMode) -> Result<f64, String> {
    let value = amount("newPensionValue", Some(value))?;
    if mode == PensionMode::Percent && value > 100.0 {
        return Err("newPensionValue must be between 0 and 100 in percent mode".to_string());
    }
    Ok(value)
}

pub(crate) fn check_sweep_amounts(amounts: &[f64]) -> Result<(), String> {
    if amounts.is_empty() || amounts.len() > MAX_SWEEP_POINTS {
        return Err(format!(
            "pensionAmounts must contain between 1 and {MAX_SWEEP_POINTS} values"
        ));
    }
    for &value in amounts {
        amount("pensionAmounts", Some(value))?;
    }
    Ok(())
}

fn amount(name: &str, value: Option<f64>) -> Result<f64, String> {
    let value = value.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be a finite amount >= 0"));
    }
    Ok(value)
}
