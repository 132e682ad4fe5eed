use serde::{Deserialize, Serialize};

use crate::error::RepaymentError;
use crate::types::*;
use crate::RepaymentResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub account_id: AccountId,
    pub principal: Money,
    #[serde(default)]
    pub status: LoanStatus,
}

/// Loan status codes (2xx).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Inactive,
    #[default]
    Current,
    Dpd1,
    Dpd5,
    Dpd30,
    Dpd60,
    Dpd90,
    Dpd120,
    Dpd150,
    Dpd180,
    Renegotiated,
    PaidOff,
}

impl LoanStatus {
    pub fn code(&self) -> u16 {
        match self {
            LoanStatus::Inactive => 210,
            LoanStatus::Current => 220,
            LoanStatus::Dpd1 => 230,
            LoanStatus::Dpd5 => 231,
            LoanStatus::Dpd30 => 232,
            LoanStatus::Dpd60 => 233,
            LoanStatus::Dpd90 => 234,
            LoanStatus::Dpd120 => 235,
            LoanStatus::Dpd150 => 236,
            LoanStatus::Dpd180 => 237,
            LoanStatus::Renegotiated => 240,
            LoanStatus::PaidOff => 250,
        }
    }

    pub fn from_code(code: u16) -> RepaymentResult<Self> {
        let status = match code {
            210 => LoanStatus::Inactive,
            220 => LoanStatus::Current,
            230 => LoanStatus::Dpd1,
            231 => LoanStatus::Dpd5,
            232 => LoanStatus::Dpd30,
            233 => LoanStatus::Dpd60,
            234 => LoanStatus::Dpd90,
            235 => LoanStatus::Dpd120,
            236 => LoanStatus::Dpd150,
            237 => LoanStatus::Dpd180,
            240 => LoanStatus::Renegotiated,
            250 => LoanStatus::PaidOff,
            other => {
                return Err(RepaymentError::InvalidInput {
                    field: "loan_status".into(),
                    reason: format!("Unknown loan status code {other}"),
                })
            }
        };
        Ok(status)
    }

    pub fn from_days_past_due(dpd: i64) -> Self {
        match dpd {
            d if d <= 0 => LoanStatus::Current,
            1..=4 => LoanStatus::Dpd1,
            5..=29 => LoanStatus::Dpd5,
            30..=59 => LoanStatus::Dpd30,
            60..=89 => LoanStatus::Dpd60,
            90..=119 => LoanStatus::Dpd90,
            120..=149 => LoanStatus::Dpd120,
            150..=179 => LoanStatus::Dpd150,
            _ => LoanStatus::Dpd180,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::PaidOff)
    }

    /// Whether a hop from `self` to `next` is allowed. Paid-off loans never
    /// reopen; everything else may move freely between buckets.
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        !self.is_terminal() || next == *self
    }
}
