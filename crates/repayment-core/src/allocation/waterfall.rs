//! Repayment allocation waterfall.
//!
//! Consumes one incoming amount against a set of instalments:
//! - late fee across every instalment (oldest due date first), then
//! - interest across every instalment, then
//! - principal across every instalment.
//!
//! Whatever is left after the principal pass is overpayment. The function is
//! pure: it returns updated copies of the instalments and never persists.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::waiver::{adjusted_demand, honor_waiver, WaiverRequest};
use crate::error::RepaymentError;
use crate::model::Payment;
use crate::types::*;
use crate::RepaymentResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    /// Unpaid instalments, oldest due date first.
    pub payments: Vec<Payment>,
    /// Incoming amount to distribute.
    pub amount: Money,
    /// Date the money arrived; decides whether the waiver still applies.
    pub allocation_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiver: Option<WaiverRequest>,
}

/// What one instalment received from a single allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub payment_id: PaymentId,
    pub loan_id: LoanId,
    pub paid: ComponentAmounts,
    /// Waiver written off because the reduced demand was settled.
    pub waived: ComponentAmounts,
    pub outstanding_after: Money,
}

impl PaymentAllocation {
    pub fn touched(&self) -> bool {
        !self.paid.is_zero() || !self.waived.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutput {
    /// Instalments after the allocation, in input order.
    pub payments: Vec<Payment>,
    pub breakdown: Vec<PaymentAllocation>,
    pub total_paid: ComponentAmounts,
    pub total_waived: ComponentAmounts,
    /// Money left after every component was satisfied.
    pub remaining_amount: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Allocate an incoming amount across instalments and wrap the result in the
/// standard envelope. An expired waiver is ignored with a warning.
pub fn allocate_payment(
    input: &AllocationInput,
) -> RepaymentResult<ComputationOutput<AllocationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let waiver = match &input.waiver {
        Some(w) if w.is_active(input.allocation_date) => Some(w),
        Some(w) => {
            warnings.push(format!(
                "Waiver {} expired on {}; allocating against full balances",
                w.id, w.valid_until
            ));
            None
        }
        None => None,
    };

    let output = allocate(&input.payments, input.amount, waiver)?;

    if output.remaining_amount > Decimal::ZERO {
        warnings.push(format!(
            "Overpayment of {} remains after all instalments were settled",
            output.remaining_amount
        ));
    }

    let assumptions = serde_json::json!({
        "allocation_order": ALLOCATION_ORDER.iter().map(|c| c.label()).collect::<Vec<_>>(),
        "instalment_order": "due_date ascending",
        "waiver_applied": waiver.map(|w| w.id),
    });

    Ok(with_metadata(
        "Sequential component waterfall: late fee, interest, then principal, each across all instalments",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}

/// Pure waterfall over `payments`. The caller decides whether `waiver` is
/// still valid.
pub fn allocate(
    payments: &[Payment],
    amount: Money,
    waiver: Option<&WaiverRequest>,
) -> RepaymentResult<AllocationOutput> {
    validate_allocation(payments, amount, waiver)?;

    let mut updated: Vec<Payment> = payments.to_vec();
    let mut breakdown: Vec<PaymentAllocation> = payments
        .iter()
        .map(|p| PaymentAllocation {
            payment_id: p.id,
            loan_id: p.loan_id,
            paid: ComponentAmounts::default(),
            waived: ComponentAmounts::default(),
            outstanding_after: p.due_amount(),
        })
        .collect();
    let mut total_paid = ComponentAmounts::default();
    let mut remaining = amount;

    for component in ALLOCATION_ORDER {
        for (i, payment) in updated.iter_mut().enumerate() {
            if remaining <= Decimal::ZERO {
                break;
            }
            let payment_waiver = waiver.and_then(|w| w.waiver_for(payment.id));
            let demand = adjusted_demand(payment, payment_waiver, component);
            if demand <= Decimal::ZERO {
                continue;
            }
            let consumed = remaining.min(demand);
            *payment.paid.get_mut(component) += consumed;
            *breakdown[i].paid.get_mut(component) += consumed;
            *total_paid.get_mut(component) += consumed;
            remaining -= consumed;
        }
    }

    let mut total_waived = ComponentAmounts::default();
    if let Some(w) = waiver {
        for (i, payment) in updated.iter_mut().enumerate() {
            let Some(payment_waiver) = w.waiver_for(payment.id) else {
                continue;
            };
            if let Some(applied) = honor_waiver(payment, payment_waiver) {
                breakdown[i].waived = applied;
                total_waived += applied;
            }
        }
    }

    for (entry, payment) in breakdown.iter_mut().zip(updated.iter()) {
        if payment.outstanding_amounts().has_negative() {
            return Err(RepaymentError::AllocationInvariant(format!(
                "payment {} ended with a negative balance",
                payment.id
            )));
        }
        entry.outstanding_after = payment.due_amount();
    }

    if total_paid.total() + remaining != amount {
        return Err(RepaymentError::AllocationInvariant(format!(
            "allocated {} plus remaining {} does not equal incoming {}",
            total_paid.total(),
            remaining,
            amount
        )));
    }

    Ok(AllocationOutput {
        payments: updated,
        breakdown,
        total_paid,
        total_waived,
        remaining_amount: remaining,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_allocation(
    payments: &[Payment],
    amount: Money,
    waiver: Option<&WaiverRequest>,
) -> RepaymentResult<()> {
    if amount <= Decimal::ZERO {
        return Err(RepaymentError::InvalidInput {
            field: "amount".into(),
            reason: "Incoming amount must be positive".into(),
        });
    }
    for p in payments {
        p.validate()?;
    }
    if payments.windows(2).any(|w| w[0].due_date > w[1].due_date) {
        return Err(RepaymentError::InvalidInput {
            field: "payments".into(),
            reason: "Instalments must be ordered by due date, oldest first".into(),
        });
    }
    if let Some(w) = waiver {
        w.validate()?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::waiver::PaymentWaiver;
    use crate::model::PaymentStatus;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instalment(id: u64, month: u32, late_fee: Decimal, interest: Decimal, principal: Decimal) -> Payment {
        Payment {
            id,
            loan_id: 1,
            account_payment_id: Some(id),
            payment_number: id as u32,
            due_date: date(2024, month, 28),
            billed: ComponentAmounts::new(late_fee, interest, principal),
            paid: ComponentAmounts::default(),
            waived: ComponentAmounts::default(),
            paid_date: None,
            status: PaymentStatus::NotDue,
        }
    }

    fn two_instalments() -> Vec<Payment> {
        vec![
            instalment(1, 1, Decimal::ZERO, dec!(10_000), dec!(40_000)),
            instalment(2, 2, Decimal::ZERO, dec!(10_000), dec!(40_000)),
        ]
    }

    #[test]
    fn test_interest_pass_runs_before_principal() {
        let out = allocate(&two_instalments(), dec!(60_000), None).unwrap();
        assert_eq!(out.payments[0].due_amount(), Decimal::ZERO);
        assert_eq!(out.payments[1].outstanding(Component::Interest), Decimal::ZERO);
        assert_eq!(out.payments[1].outstanding(Component::Principal), dec!(40_000));
        assert_eq!(out.total_paid.interest, dec!(20_000));
        assert_eq!(out.total_paid.principal, dec!(40_000));
        assert_eq!(out.remaining_amount, Decimal::ZERO);
    }

    #[test]
    fn test_overpayment_is_left_over() {
        let out = allocate(&two_instalments(), dec!(105_000), None).unwrap();
        assert!(out.payments.iter().all(|p| p.is_settled()));
        assert_eq!(out.remaining_amount, dec!(5_000));
    }

    #[test]
    fn test_late_fee_consumed_first() {
        let payments = vec![
            instalment(1, 1, dec!(3_000), dec!(10_000), dec!(40_000)),
            instalment(2, 2, dec!(2_000), dec!(10_000), dec!(40_000)),
        ];
        let out = allocate(&payments, dec!(4_000), None).unwrap();
        assert_eq!(out.breakdown[0].paid.late_fee, dec!(3_000));
        assert_eq!(out.breakdown[1].paid.late_fee, dec!(1_000));
        assert_eq!(out.total_paid.interest, Decimal::ZERO);
        assert_eq!(out.total_paid.principal, Decimal::ZERO);
    }

    #[test]
    fn test_fully_waived_instalment_is_skipped() {
        let payments = two_instalments();
        let waiver = WaiverRequest {
            id: 9,
            account_id: 1,
            program: "covid_relief".into(),
            valid_until: date(2024, 6, 30),
            payment_waivers: vec![PaymentWaiver {
                payment_id: 1,
                amounts: ComponentAmounts::new(Decimal::ZERO, dec!(10_000), dec!(40_000)),
            }],
        };
        let out = allocate(&payments, dec!(15_000), Some(&waiver)).unwrap();
        assert_eq!(out.breakdown[0].paid.total(), Decimal::ZERO);
        assert_eq!(out.breakdown[0].waived.total(), dec!(50_000));
        assert!(out.payments[0].is_settled());
        assert_eq!(out.breakdown[1].paid.interest, dec!(10_000));
        assert_eq!(out.breakdown[1].paid.principal, dec!(5_000));
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let err = allocate(&two_instalments(), Decimal::ZERO, None).unwrap_err();
        assert!(matches!(err, RepaymentError::InvalidInput { .. }));
    }

    #[test]
    fn test_rejects_unordered_instalments() {
        let mut payments = two_instalments();
        payments.reverse();
        assert!(allocate(&payments, dec!(1_000), None).is_err());
    }

    #[test]
    fn test_envelope_warns_on_expired_waiver() {
        let input = AllocationInput {
            payments: two_instalments(),
            amount: dec!(10_000),
            allocation_date: date(2024, 7, 1),
            waiver: Some(WaiverRequest {
                id: 3,
                account_id: 1,
                program: "r4".into(),
                valid_until: date(2024, 6, 30),
                payment_waivers: vec![PaymentWaiver {
                    payment_id: 1,
                    amounts: ComponentAmounts::new(Decimal::ZERO, dec!(10_000), Decimal::ZERO),
                }],
            }),
        };
        let out = allocate_payment(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.result.breakdown[0].paid.interest, dec!(10_000));
        assert_eq!(out.result.total_waived, ComponentAmounts::default());
    }
}
