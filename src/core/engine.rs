use tracing::debug;

use super::allowance::personal_allowance;
use super::bands::evaluate_bands;
use super::family_benefit;
use super::thresholds::ThresholdTable;
use super::types::{
    FamilyBenefitResult, Inputs, MarginalRateEstimate, PensionMode, SavingsAttribution,
    TaxComputation,
};

/// Whether an evaluation also runs the counterfactual baselines that fill
/// `TaxComputation::savings`. Baselines are always evaluated with `Suppress`,
/// so recursion is at most one level deep.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Attribution {
    Include,
    Suppress,
}

/// Evaluates one scenario, including savings attribution.
///
/// Non-finite money fields are read as zero, the same as a missing field.
pub fn evaluate(inputs: &Inputs, table: &ThresholdTable) -> TaxComputation {
    compute(&finite(inputs), table, Attribution::Include)
}

fn finite(inputs: &Inputs) -> Inputs {
    let or_zero = |value: f64| if value.is_finite() { value } else { 0.0 };
    Inputs {
        salary: or_zero(inputs.salary),
        bonus: or_zero(inputs.bonus),
        pension: or_zero(inputs.pension),
        salary_exchange: or_zero(inputs.salary_exchange),
        partner_income: inputs.partner_income.map(or_zero),
        ..inputs.clone()
    }
}

fn compute(inputs: &Inputs, table: &ThresholdTable, attribution: Attribution) -> TaxComputation {
    let pre_exchange_gross = inputs.salary + inputs.bonus;
    let employee_pension = match inputs.pension_mode {
        PensionMode::Percent => pre_exchange_gross * (inputs.pension / 100.0),
        PensionMode::Amount => inputs.pension,
    };
    // Only salary can be exchanged; bonus is paid as normal.
    let salary_exchange = inputs.salary_exchange.min(inputs.salary).max(0.0);
    let gross = pre_exchange_gross - salary_exchange;

    // The pension reduces the income used for the allowance taper and the
    // benefit charge, but contribution is still charged on `gross`.
    let adjusted_before_pension = gross;
    let adjusted_before_allowance = gross - employee_pension;
    let allowance = personal_allowance(adjusted_before_allowance, table);
    let taxable_income = (gross - employee_pension - allowance).max(0.0);

    let income_tax = evaluate_bands(taxable_income, &table.income_tax_bands);
    let contribution = evaluate_bands(gross, &table.contribution_bands());

    let gross_benefit = family_benefit::entitlement(inputs.dependents, &table.family_benefit);
    let benefit = family_benefit::charge(
        adjusted_before_allowance,
        gross_benefit,
        &table.family_benefit,
    );
    let benefit_charge = benefit.charge;

    let total_deductions =
        income_tax.total + contribution.total + employee_pension + salary_exchange + benefit_charge;
    let net = gross - income_tax.total - contribution.total - employee_pension - benefit_charge;
    let effective_average_rate = if gross == 0.0 {
        0.0
    } else {
        (income_tax.total + contribution.total + benefit_charge) / gross
    };

    let mut computation = TaxComputation {
        gross,
        pre_exchange_gross,
        adjusted_net_income_before_pension: adjusted_before_pension,
        adjusted_net_income_before_allowance: adjusted_before_allowance,
        adjusted_net_income: adjusted_before_allowance,
        personal_allowance: allowance,
        taxable_income,
        income_tax,
        contribution,
        family_benefit: (gross_benefit > 0.0).then_some(benefit),
        total_deductions,
        net,
        effective_average_rate,
        marginal_rate_estimates: Vec::new(),
        notes: Vec::new(),
        employee_pension_amount: employee_pension,
        pension_percent_applied: inputs.pension_is_percent().then_some(inputs.pension),
        salary_exchange_amount: salary_exchange,
        savings: SavingsAttribution::default(),
    };

    computation.notes = marginal_rate_notes(&computation, table);
    computation.marginal_rate_estimates = marginal_rate_estimates(&computation);

    if attribution == Attribution::Include {
        computation.savings = attribute_savings(inputs, &computation, table);
    }

    debug!(
        gross,
        taxable_income,
        income_tax = computation.income_tax.total,
        contribution = computation.contribution.total,
        benefit_charge,
        net,
        attribution = ?attribution,
        "evaluated tax scenario"
    );

    computation
}

/// Differences the real result against two counterfactuals: (a) no pension and
/// no exchange, (b) exchange kept but no pension.
fn attribute_savings(
    inputs: &Inputs,
    computation: &TaxComputation,
    table: &ThresholdTable,
) -> SavingsAttribution {
    let without_contributions = Inputs {
        pension: 0.0,
        pension_mode: PensionMode::Amount,
        salary_exchange: 0.0,
        ..inputs.clone()
    };
    let exchange_only = Inputs {
        pension: 0.0,
        pension_mode: PensionMode::Amount,
        ..inputs.clone()
    };
    let baseline_all = compute(&without_contributions, table, Attribution::Suppress);
    let baseline_exchange = compute(&exchange_only, table, Attribution::Suppress);

    let contribution_saved_from_exchange =
        (baseline_all.contribution.total - baseline_exchange.contribution.total).max(0.0);
    let tax_saved_from_pension =
        (baseline_exchange.tax_and_charge() - computation.tax_and_charge()).max(0.0);
    let tax_saved_from_exchange =
        (baseline_all.tax_and_charge() - baseline_exchange.tax_and_charge()).max(0.0);
    let benefit_charge_saved =
        (baseline_all.benefit_charge() - computation.benefit_charge()).max(0.0);
    let total_saved = (baseline_all.tax_charge_and_contribution()
        - computation.tax_charge_and_contribution())
    .max(0.0);

    let pension = computation.employee_pension_amount;
    let all_contributions = pension + computation.salary_exchange_amount;

    SavingsAttribution {
        contribution_saved_from_exchange,
        tax_saved_from_pension,
        effective_pension_relief_rate: relief_rate(tax_saved_from_pension, pension),
        tax_saved_from_exchange,
        benefit_charge_saved,
        total_saved,
        effective_overall_relief_rate: relief_rate(total_saved, all_contributions),
    }
}

fn relief_rate(saved: f64, contributed: f64) -> f64 {
    if contributed > 0.0 {
        saved / contributed
    } else {
        0.0
    }
}

fn marginal_rate_notes(computation: &TaxComputation, table: &ThresholdTable) -> Vec<String> {
    let income = computation.adjusted_net_income;
    let mut notes = Vec::new();

    if income > table.allowance_taper_start && income < table.allowance_exhausted_at() {
        notes.push("In Personal Allowance taper zone (effective ~60% marginal).".to_string());
    }

    let benefit = &table.family_benefit;
    let entitled = computation
        .family_benefit
        .is_some_and(|FamilyBenefitResult { gross, .. }| gross > 0.0);
    if entitled && income > benefit.charge_start && income < benefit.charge_end {
        notes.push("In Child Benefit withdrawal zone.".to_string());
    }

    notes
}

fn marginal_rate_estimates(computation: &TaxComputation) -> Vec<MarginalRateEstimate> {
    let taxable = if computation.taxable_income == 0.0 {
        1.0
    } else {
        computation.taxable_income
    };
    let base_rate = (computation.income_tax.total / taxable * 1_000.0).round() / 1_000.0;

    vec![
        MarginalRateEstimate {
            label: "Base bands".to_string(),
            effective_rate: base_rate,
        },
        MarginalRateEstimate {
            label: "Overall effective".to_string(),
            effective_rate: computation.effective_average_rate,
        },
    ]
}
