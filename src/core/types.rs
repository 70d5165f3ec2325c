use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PensionMode {
    #[default]
    Amount,
    Percent,
}

/// Annual income inputs for a single evaluation.
///
/// `Default` is all zeros in `PensionMode::Amount`; request payloads fill
/// missing fields from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs {
    pub salary: f64,
    pub bonus: f64,
    /// A currency amount, or a percentage of salary + bonus in `Percent` mode.
    pub pension: f64,
    pub pension_mode: PensionMode,
    pub salary_exchange: f64,
    pub dependents: u32,
    /// Reserved for household-level rules; not read by the engine.
    pub partner_income: Option<f64>,
}

impl Inputs {
    pub fn pension_is_percent(&self) -> bool {
        self.pension_mode == PensionMode::Percent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandResult {
    pub rate: f64,
    pub portion: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandBreakdown {
    pub total: f64,
    pub bands: Vec<BandResult>,
}

impl BandBreakdown {
    pub fn allocated(&self) -> f64 {
        self.bands.iter().map(|band| band.portion).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyBenefitResult {
    pub gross: f64,
    pub charge: f64,
    pub net: f64,
    /// 0..=100; fractional under the linear withdrawal policy.
    pub withdrawn_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAttribution {
    pub contribution_saved_from_exchange: f64,
    /// Income tax plus benefit charge avoided by the ordinary pension contribution.
    pub tax_saved_from_pension: f64,
    pub effective_pension_relief_rate: f64,
    pub tax_saved_from_exchange: f64,
    pub benefit_charge_saved: f64,
    pub total_saved: f64,
    pub effective_overall_relief_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginalRateEstimate {
    pub label: String,
    pub effective_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxComputation {
    /// Gross income after salary exchange.
    pub gross: f64,
    pub pre_exchange_gross: f64,
    pub adjusted_net_income_before_pension: f64,
    pub adjusted_net_income_before_allowance: f64,
    pub adjusted_net_income: f64,
    pub personal_allowance: f64,
    pub taxable_income: f64,
    pub income_tax: BandBreakdown,
    pub contribution: BandBreakdown,
    pub family_benefit: Option<FamilyBenefitResult>,
    pub total_deductions: f64,
    pub net: f64,
    pub effective_average_rate: f64,
    pub marginal_rate_estimates: Vec<MarginalRateEstimate>,
    pub notes: Vec<String>,
    pub employee_pension_amount: f64,
    pub pension_percent_applied: Option<f64>,
    pub salary_exchange_amount: f64,
    pub savings: SavingsAttribution,
}

impl TaxComputation {
    pub fn benefit_charge(&self) -> f64 {
        self.family_benefit.map_or(0.0, |benefit| benefit.charge)
    }

    pub fn benefit_net(&self) -> f64 {
        self.family_benefit.map_or(0.0, |benefit| benefit.net)
    }

    /// Income tax plus benefit charge, the figure pension relief is measured against.
    pub fn tax_and_charge(&self) -> f64 {
        self.income_tax.total + self.benefit_charge()
    }

    pub fn tax_charge_and_contribution(&self) -> f64 {
        self.tax_and_charge() + self.contribution.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDeltas {
    pub net: f64,
    pub total_tax: f64,
    pub family_benefit_recovered: f64,
    pub allowance_recovered: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub base: TaxComputation,
    pub adjusted: TaxComputation,
    pub deltas: ScenarioDeltas,
}
