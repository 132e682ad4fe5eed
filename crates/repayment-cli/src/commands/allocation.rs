use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use repayment_core::allocation::{self, AllocationInput};

/// Arguments for a single waterfall allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON input file (payments, amount, allocation_date, optional waiver)
    #[arg(long)]
    pub input: Option<String>,

    /// Repayment amount, overriding the one in the input
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Date the money arrived (YYYY-MM-DD), overriding the input
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut allocation_input: AllocationInput = super::read_input(args.input.as_deref(), "allocation")?;
    if let Some(amount) = args.amount {
        allocation_input.amount = amount;
    }
    if let Some(date) = args.date {
        allocation_input.allocation_date = date;
    }

    let result = allocation::allocate_payment(&allocation_input)?;
    Ok(serde_json::to_value(result)?)
}
