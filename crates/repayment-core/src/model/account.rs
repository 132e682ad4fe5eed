use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// A customer's credit facility. Repayments are posted against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub customer_id: u64,
    /// Wallet balance credited with overpayments.
    #[serde(default)]
    pub cashback_balance: Money,
}

/// Billing unit grouping every instalment of an account that shares a due date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPayment {
    pub id: AccountPaymentId,
    pub account_id: AccountId,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub due_amount: Money,
    #[serde(default)]
    pub paid_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: AccountPaymentStatus,
    pub payment_ids: Vec<PaymentId>,
}

impl AccountPayment {
    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountPaymentStatus {
    #[default]
    Unpaid,
    PartiallyPaid,
    PaidOnTime,
    PaidWithinGrace,
    PaidLate,
}

impl AccountPaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(
            self,
            AccountPaymentStatus::PaidOnTime
                | AccountPaymentStatus::PaidWithinGrace
                | AccountPaymentStatus::PaidLate
        )
    }
}
