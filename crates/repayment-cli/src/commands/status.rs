use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use repayment_core::status::{self, PaidStatusInput};
use repayment_core::RepaymentConfig;

use crate::input;

/// Arguments for paid-off sub-status resolution
#[derive(Args)]
pub struct PaidStatusArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Instalment due date (YYYY-MM-DD)
    #[arg(long)]
    pub due_date: Option<NaiveDate>,

    /// Date the instalment was paid off (YYYY-MM-DD)
    #[arg(long)]
    pub paid_date: Option<NaiveDate>,

    /// Grace period in days; defaults to the configured value
    #[arg(long)]
    pub grace_period_days: Option<i64>,
}

pub fn run_paid_status(args: PaidStatusArgs, config: &RepaymentConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let status_input: PaidStatusInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        PaidStatusInput {
            due_date: args.due_date
                .ok_or("--due-date is required (or provide --input)")?,
            paid_date: args.paid_date
                .ok_or("--paid-date is required (or provide --input)")?,
            grace_period_days: args.grace_period_days.unwrap_or(config.grace_period_days),
        }
    };

    let result = status::evaluate_paid_status(&status_input)?;
    Ok(serde_json::to_value(result)?)
}
