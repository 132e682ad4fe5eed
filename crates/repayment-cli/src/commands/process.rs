use clap::Args;
use serde_json::Value;
use tracing::debug;

use repayment_core::engine::{self, SimulationInput};
use repayment_core::RepaymentConfig;

/// Arguments for replaying repayments against a ledger
#[derive(Args)]
pub struct ProcessArgs {
    /// Path to JSON input file (ledger, transactions, optional config)
    #[arg(long)]
    pub input: Option<String>,

    /// Treat this side-effect kind as failing (repeatable), e.g. overpayment_notification
    #[arg(long = "fail-effect")]
    pub fail_effects: Vec<String>,
}

/// `config` replaces the input's own settings when `--config` was given.
pub fn run_process(args: ProcessArgs, config: Option<RepaymentConfig>) -> Result<Value, Box<dyn std::error::Error>> {
    let mut simulation_input: SimulationInput = super::read_input(args.input.as_deref(), "process")?;
    if let Some(config) = config {
        simulation_input.config = config;
    }
    simulation_input.failing_effects.extend(args.fail_effects);
    debug!(
        transactions = simulation_input.transactions.len(),
        failing = ?simulation_input.failing_effects,
        "replaying repayments"
    );

    let result = engine::simulate(&simulation_input)?;
    Ok(serde_json::to_value(result)?)
}
