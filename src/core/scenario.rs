use super::engine::evaluate;
use super::thresholds::ThresholdTable;
use super::types::{Inputs, PensionMode, ScenarioComparison, ScenarioDeltas, TaxComputation};

/// Evaluates `base` and the same inputs with the pension replaced by
/// `new_pension_value`, read in the base's pension mode.
pub fn compare_pension_scenario(
    base: &Inputs,
    new_pension_value: f64,
    table: &ThresholdTable,
) -> ScenarioComparison {
    let base_result = evaluate(base, table);
    let adjusted_inputs = Inputs {
        pension: new_pension_value,
        ..base.clone()
    };
    let adjusted = evaluate(&adjusted_inputs, table);

    let deltas = ScenarioDeltas {
        net: adjusted.net - base_result.net,
        total_tax: (adjusted.income_tax.total + adjusted.contribution.total)
            - (base_result.income_tax.total + base_result.contribution.total),
        family_benefit_recovered: adjusted.benefit_net() - base_result.benefit_net(),
        allowance_recovered: adjusted.personal_allowance - base_result.personal_allowance,
    };

    ScenarioComparison {
        base: base_result,
        adjusted,
        deltas,
    }
}

/// Evaluates `base` once per fixed pension amount. Amounts are always read as
/// currency, whatever mode `base` uses.
pub fn pension_sweep(
    base: &Inputs,
    pension_amounts: &[f64],
    table: &ThresholdTable,
) -> Vec<TaxComputation> {
    pension_amounts
        .iter()
        .map(|&pension| {
            let inputs = Inputs {
                pension,
                pension_mode: PensionMode::Amount,
                ..base.clone()
            };
            evaluate(&inputs, table)
        })
        .collect()
}
