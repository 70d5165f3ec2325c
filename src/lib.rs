pub mod api;
pub mod cli;
pub mod core;

pub use crate::core::{
    Inputs, PensionMode, ScenarioComparison, TaxComputation, ThresholdTable,
    compare_pension_scenario, evaluate,
};
