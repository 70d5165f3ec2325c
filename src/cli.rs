use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::api::payload::{
    InputsPayload, build_inputs, check_new_pension_value, check_sweep_amounts,
};
use crate::core::{
    Inputs, ThresholdError, ThresholdTable, compare_pension_scenario, evaluate, pension_sweep,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Thresholds(#[from] ThresholdError),

    #[error("{0}")]
    Input(String),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "takehome",
    about = "UK take-home pay estimator (income tax, National Insurance, Child Benefit charge, pension relief)"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON threshold table to use instead of the built-in tax year"
    )]
    pub thresholds: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate one scenario and print the itemised result
    Evaluate(IncomeArgs),
    /// Compare the scenario against a different pension value
    Compare {
        #[command(flatten)]
        income: IncomeArgs,
        #[arg(
            long,
            help = "Replacement pension value, read in the same mode as --pension"
        )]
        new_pension: f64,
    },
    /// Evaluate the scenario once per fixed pension amount
    Sweep {
        #[command(flatten)]
        income: IncomeArgs,
        #[arg(long, value_delimiter = ',', required = true)]
        pension_amounts: Vec<f64>,
    },
    /// Print the active threshold table
    Thresholds,
    /// Serve the JSON HTTP API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct IncomeArgs {
    #[arg(long, default_value_t = 0.0, help = "Annual salary")]
    pub salary: f64,
    #[arg(long, default_value_t = 0.0, help = "Annual bonus (not exchangeable)")]
    pub bonus: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Employee pension contribution: an amount, or a percent of salary + bonus with --pension-percent"
    )]
    pub pension: f64,
    #[arg(long)]
    pub pension_percent: bool,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Salary redirected before tax and National Insurance, capped at salary"
    )]
    pub salary_exchange: f64,
    #[arg(long, default_value_t = 0)]
    pub dependents: u32,
    #[arg(long, help = "Partner income (recorded, not used in the calculation)")]
    pub partner_income: Option<f64>,
}

impl IncomeArgs {
    fn into_inputs(self) -> Result<Inputs, CliError> {
        build_inputs(InputsPayload {
            salary: Some(self.salary),
            bonus: Some(self.bonus),
            pension: Some(self.pension),
            pension_is_percent: Some(self.pension_percent),
            salary_exchange: Some(self.salary_exchange),
            dependents: Some(self.dependents),
            partner_income: self.partner_income,
        })
        .map_err(CliError::Input)
    }
}

pub fn load_table(path: Option<&PathBuf>) -> Result<ThresholdTable, ThresholdError> {
    match path {
        Some(path) => {
            let table = ThresholdTable::load(path)?;
            info!(path = %path.display(), tax_year = %table.tax_year, "loaded threshold table");
            Ok(table)
        }
        None => Ok(ThresholdTable::uk_2025_26()),
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let table = load_table(cli.thresholds.as_ref())?;

    match cli.command {
        Command::Serve { port } => crate::api::run_http_server(port, table).await?,
        command => println!("{}", render(command, &table)?),
    }
    Ok(())
}

fn render(command: Command, table: &ThresholdTable) -> Result<String, CliError> {
    let json = match command {
        Command::Evaluate(income) => {
            let inputs = income.into_inputs()?;
            serde_json::to_string_pretty(&evaluate(&inputs, table))?
        }
        Command::Compare {
            income,
            new_pension,
        } => {
            let inputs = income.into_inputs()?;
            let new_pension = check_new_pension_value(new_pension, inputs.pension_mode)
                .map_err(CliError::Input)?;
            serde_json::to_string_pretty(&compare_pension_scenario(&inputs, new_pension, table))?
        }
        Command::Sweep {
            income,
            pension_amounts,
        } => {
            let inputs = income.into_inputs()?;
            check_sweep_amounts(&pension_amounts).map_err(CliError::Input)?;
            serde_json::to_string_pretty(&pension_sweep(&inputs, &pension_amounts, table))?
        }
        Command::Thresholds => serde_json::to_string_pretty(table)?,
        Command::Serve { .. } => {
            return Err(CliError::Input("serve does not render output".to_string()));
        }
    };
    Ok(json)
}
