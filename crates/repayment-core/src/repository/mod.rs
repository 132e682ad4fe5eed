//! Persistence seam.
//!
//! The allocation logic never touches storage directly. The payment flow reads
//! through [`RepaymentRepository`] and hands every mutation of one repayment
//! event to [`RepaymentRepository::commit`] as a single [`ChangeSet`], which
//! implementations apply atomically. Duplicate transaction ids are rejected at
//! commit time the way a unique constraint would.

#[cfg(feature = "engine")]
pub mod memory;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocation::WaiverRequest;
use crate::model::{Account, AccountPayment, Loan, PaybackTransaction, Payment};
use crate::overpayment::OverpaymentCredit;
use crate::types::*;
use crate::RepaymentResult;

#[cfg(feature = "engine")]
pub use memory::InMemoryRepository;

/// Everything one unit of work wants to write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<PaybackTransaction>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub account_payments: Vec<AccountPayment>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overpayment: Option<OverpaymentCredit>,
}

/// Full contents of a ledger, used to seed and export in-memory state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub account_payments: Vec<AccountPayment>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub waivers: Vec<WaiverRequest>,
    #[serde(default)]
    pub transactions: Vec<PaybackTransaction>,
    #[serde(default)]
    pub overpayments: Vec<OverpaymentCredit>,
}

pub trait RepaymentRepository {
    fn account(&self, id: AccountId) -> RepaymentResult<Account>;

    fn loan(&self, id: LoanId) -> RepaymentResult<Loan>;

    /// Account payments of `account_id` not yet paid off, oldest due date first.
    fn unpaid_account_payments(&self, account_id: AccountId) -> RepaymentResult<Vec<AccountPayment>>;

    fn payments(&self, ids: &[PaymentId]) -> RepaymentResult<Vec<Payment>>;

    fn loan_payments(&self, loan_id: LoanId) -> RepaymentResult<Vec<Payment>>;

    fn active_waiver(&self, account_id: AccountId, on: NaiveDate) -> RepaymentResult<Option<WaiverRequest>>;

    fn is_transaction_recorded(&self, transaction_id: &str) -> RepaymentResult<bool>;

    /// Apply `changes` atomically: either every write lands or none does.
    fn commit(&mut self, changes: ChangeSet) -> RepaymentResult<()>;
}
