use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RepaymentError;
use crate::types::*;
use crate::RepaymentResult;

/// Ledger record of one incoming repayment event, whatever the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaybackTransaction {
    /// Idempotency key. A second event with the same id is rejected.
    pub transaction_id: String,
    pub account_id: AccountId,
    pub amount: Money,
    pub transaction_date: NaiveDate,
    pub source: RepaymentSource,
    /// Partner checkout request settled by this payment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_request_id: Option<String>,
}

impl PaybackTransaction {
    pub fn validate(&self) -> RepaymentResult<()> {
        if self.transaction_id.trim().is_empty() {
            return Err(RepaymentError::InvalidInput {
                field: "transaction_id".into(),
                reason: "Transaction id cannot be empty".into(),
            });
        }
        if self.amount <= Decimal::ZERO {
            return Err(RepaymentError::InvalidInput {
                field: "amount".into(),
                reason: "Repayment amount must be positive".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepaymentSource {
    BankTransfer { bank: String },
    Autodebet { vendor: String },
    CashbackRedemption,
    PartnerChannel { partner: String },
}

impl RepaymentSource {
    pub fn label(&self) -> String {
        match self {
            RepaymentSource::BankTransfer { bank } => format!("bank_transfer:{bank}"),
            RepaymentSource::Autodebet { vendor } => format!("autodebet:{vendor}"),
            RepaymentSource::CashbackRedemption => "cashback".to_string(),
            RepaymentSource::PartnerChannel { partner } => format!("partner:{partner}"),
        }
    }
}
