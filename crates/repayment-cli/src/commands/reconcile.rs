use clap::Args;
use serde_json::Value;

use repayment_core::reconciliation::{self, LoanStatusUpdate, ReconciliationInput};

use crate::input;

/// Arguments for loan status reconciliation
#[derive(Args)]
pub struct ReconcileArgs {
    /// Path to JSON input file (ledger and updates)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a separate JSON array of {loan_id, status_code} updates
    #[arg(long)]
    pub updates: Option<String>,
}

pub fn run_reconcile(args: ReconcileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut reconciliation_input: ReconciliationInput = super::read_input(args.input.as_deref(), "reconcile")?;
    if let Some(ref path) = args.updates {
        let updates: Vec<LoanStatusUpdate> = input::file::read_json(path)?;
        reconciliation_input.updates = updates;
    }

    let result = reconciliation::reconcile(&reconciliation_input)?;
    Ok(serde_json::to_value(result)?)
}
