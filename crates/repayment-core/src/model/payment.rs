use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RepaymentError;
use crate::types::*;
use crate::RepaymentResult;

/// One instalment of a loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_payment_id: Option<AccountPaymentId>,
    /// 1-based instalment number within the loan.
    pub payment_number: u32,
    pub due_date: NaiveDate,
    /// Amounts charged for this instalment (late fee grows as it is assessed).
    pub billed: ComponentAmounts,
    #[serde(default)]
    pub paid: ComponentAmounts,
    /// Amounts forgiven through an honoured waiver.
    #[serde(default)]
    pub waived: ComponentAmounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: PaymentStatus,
}

impl Payment {
    pub fn outstanding(&self, component: Component) -> Money {
        self.billed.get(component) - self.paid.get(component) - self.waived.get(component)
    }

    pub fn outstanding_amounts(&self) -> ComponentAmounts {
        ComponentAmounts::new(
            self.outstanding(Component::LateFee),
            self.outstanding(Component::Interest),
            self.outstanding(Component::Principal),
        )
    }

    /// Aggregate outstanding balance.
    pub fn due_amount(&self) -> Money {
        self.outstanding_amounts().total()
    }

    pub fn paid_amount(&self) -> Money {
        self.paid.total()
    }

    pub fn is_settled(&self) -> bool {
        self.due_amount() <= Decimal::ZERO
    }

    pub fn validate(&self) -> RepaymentResult<()> {
        if self.billed.has_negative() || self.paid.has_negative() || self.waived.has_negative() {
            return Err(RepaymentError::InvalidInput {
                field: format!("payment.{}", self.id),
                reason: "Component amounts cannot be negative".into(),
            });
        }
        if self.outstanding_amounts().has_negative() {
            return Err(RepaymentError::InvalidInput {
                field: format!("payment.{}", self.id),
                reason: "Paid plus waived exceeds the billed amount".into(),
            });
        }
        Ok(())
    }
}

/// Instalment status codes. 31x/32x are unpaid buckets, 33x are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    NotDue,
    DueIn3Days,
    DueToday,
    DueIn1Day,
    Dpd1,
    Dpd5,
    Dpd30,
    Dpd60,
    Dpd90,
    Dpd120,
    Dpd150,
    Dpd180,
    PaidOnTime,
    PaidWithinGrace,
    PaidLate,
}

impl PaymentStatus {
    pub fn code(&self) -> u16 {
        match self {
            PaymentStatus::NotDue => 310,
            PaymentStatus::DueIn3Days => 311,
            PaymentStatus::DueToday => 312,
            PaymentStatus::DueIn1Day => 313,
            PaymentStatus::Dpd1 => 320,
            PaymentStatus::Dpd5 => 321,
            PaymentStatus::Dpd30 => 322,
            PaymentStatus::Dpd60 => 323,
            PaymentStatus::Dpd90 => 324,
            PaymentStatus::Dpd120 => 325,
            PaymentStatus::Dpd150 => 326,
            PaymentStatus::Dpd180 => 327,
            PaymentStatus::PaidOnTime => 330,
            PaymentStatus::PaidWithinGrace => 331,
            PaymentStatus::PaidLate => 332,
        }
    }

    pub fn from_code(code: u16) -> RepaymentResult<Self> {
        let status = match code {
            310 => PaymentStatus::NotDue,
            311 => PaymentStatus::DueIn3Days,
            312 => PaymentStatus::DueToday,
            313 => PaymentStatus::DueIn1Day,
            320 => PaymentStatus::Dpd1,
            321 => PaymentStatus::Dpd5,
            322 => PaymentStatus::Dpd30,
            323 => PaymentStatus::Dpd60,
            324 => PaymentStatus::Dpd90,
            325 => PaymentStatus::Dpd120,
            326 => PaymentStatus::Dpd150,
            327 => PaymentStatus::Dpd180,
            330 => PaymentStatus::PaidOnTime,
            331 => PaymentStatus::PaidWithinGrace,
            332 => PaymentStatus::PaidLate,
            other => {
                return Err(RepaymentError::InvalidInput {
                    field: "payment_status".into(),
                    reason: format!("Unknown payment status code {other}"),
                })
            }
        };
        Ok(status)
    }

    pub fn is_paid(&self) -> bool {
        matches!(
            self,
            PaymentStatus::PaidOnTime | PaymentStatus::PaidWithinGrace | PaymentStatus::PaidLate
        )
    }

    /// Bucket for an instalment that still owes money on `today`.
    pub fn for_unpaid(due_date: NaiveDate, today: NaiveDate) -> Self {
        let days_until_due = (due_date - today).num_days();
        match days_until_due {
            d if d > 3 => PaymentStatus::NotDue,
            2..=3 => PaymentStatus::DueIn3Days,
            1 => PaymentStatus::DueIn1Day,
            0 => PaymentStatus::DueToday,
            d => match -d {
                1..=4 => PaymentStatus::Dpd1,
                5..=29 => PaymentStatus::Dpd5,
                30..=59 => PaymentStatus::Dpd30,
                60..=89 => PaymentStatus::Dpd60,
                90..=119 => PaymentStatus::Dpd90,
                120..=149 => PaymentStatus::Dpd120,
                150..=179 => PaymentStatus::Dpd150,
                _ => PaymentStatus::Dpd180,
            },
        }
    }
}
