mod allowance;
mod bands;
mod engine;
mod family_benefit;
mod scenario;
mod thresholds;
mod types;

pub use allowance::personal_allowance;
pub use bands::evaluate_bands;
pub use engine::evaluate;
pub use family_benefit::{charge as family_benefit_charge, entitlement as family_benefit_entitlement};
pub use scenario::{compare_pension_scenario, pension_sweep};
pub use thresholds::{
    Band, ContributionThresholds, FamilyBenefitThresholds, ThresholdError, ThresholdTable,
    WithdrawalPolicy,
};
pub use types::{
    BandBreakdown, BandResult, FamilyBenefitResult, Inputs, MarginalRateEstimate, PensionMode,
    SavingsAttribution, ScenarioComparison, ScenarioDeltas, TaxComputation,
};
