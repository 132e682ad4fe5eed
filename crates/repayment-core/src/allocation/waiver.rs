//! Waiver agreements.
//!
//! A waiver forgives part of what specific instalments owe, provided the
//! customer pays the rest before the agreement expires. During allocation the
//! agreed amounts are subtracted from each instalment's demand; once that
//! reduced demand is fully settled the waived amounts are written off so the
//! instalment can be closed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RepaymentError;
use crate::model::Payment;
use crate::types::*;
use crate::RepaymentResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiverRequest {
    pub id: u64,
    pub account_id: AccountId,
    /// Collection programme that granted the waiver.
    pub program: String,
    /// Last day on which a payment still honours the agreement.
    pub valid_until: NaiveDate,
    pub payment_waivers: Vec<PaymentWaiver>,
}

/// Approved forgiveness for one instalment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentWaiver {
    pub payment_id: PaymentId,
    pub amounts: ComponentAmounts,
}

impl WaiverRequest {
    pub fn is_active(&self, on: NaiveDate) -> bool {
        on <= self.valid_until
    }

    pub fn waiver_for(&self, payment_id: PaymentId) -> Option<&PaymentWaiver> {
        self.payment_waivers
            .iter()
            .find(|w| w.payment_id == payment_id)
    }

    pub fn validate(&self) -> RepaymentResult<()> {
        for w in &self.payment_waivers {
            if w.amounts.has_negative() {
                return Err(RepaymentError::InvalidInput {
                    field: format!("waiver.{}.payment.{}", self.id, w.payment_id),
                    reason: "Waiver amounts cannot be negative".into(),
                });
            }
        }
        Ok(())
    }
}

/// Agreed forgiveness for `component` not yet written off on `payment`.
pub fn remaining_waiver(payment: &Payment, waiver: &PaymentWaiver, component: Component) -> Money {
    (waiver.amounts.get(component) - payment.waived.get(component)).max(Decimal::ZERO)
}

/// What `payment` still demands for `component` once the waiver is netted off.
pub fn adjusted_demand(
    payment: &Payment,
    waiver: Option<&PaymentWaiver>,
    component: Component,
) -> Money {
    let outstanding = payment.outstanding(component).max(Decimal::ZERO);
    match waiver {
        Some(w) => (outstanding - remaining_waiver(payment, w, component)).max(Decimal::ZERO),
        None => outstanding,
    }
}

/// Write off the waived amounts once the reduced demand is fully paid.
///
/// Returns the amounts written off, or `None` if the payment still owes
/// something beyond the waiver.
pub fn honor_waiver(payment: &mut Payment, waiver: &PaymentWaiver) -> Option<ComponentAmounts> {
    let still_owed = ALLOCATION_ORDER
        .iter()
        .any(|c| adjusted_demand(payment, Some(waiver), *c) > Decimal::ZERO);
    if still_owed {
        return None;
    }

    let mut applied = ComponentAmounts::default();
    for component in ALLOCATION_ORDER {
        let amount = remaining_waiver(payment, waiver, component)
            .min(payment.outstanding(component).max(Decimal::ZERO));
        *payment.waived.get_mut(component) += amount;
        *applied.get_mut(component) = amount;
    }
    Some(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentStatus;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payment() -> Payment {
        Payment {
            id: 7,
            loan_id: 1,
            account_payment_id: None,
            payment_number: 2,
            due_date: date(2024, 1, 5),
            billed: ComponentAmounts::new(dec!(20_000), dec!(10_000), dec!(40_000)),
            paid: ComponentAmounts::default(),
            waived: ComponentAmounts::default(),
            paid_date: None,
            status: PaymentStatus::Dpd30,
        }
    }

    fn waiver() -> PaymentWaiver {
        PaymentWaiver {
            payment_id: 7,
            amounts: ComponentAmounts::new(dec!(20_000), dec!(5_000), Decimal::ZERO),
        }
    }

    #[test]
    fn test_adjusted_demand_nets_waiver() {
        let p = payment();
        let w = waiver();
        assert_eq!(adjusted_demand(&p, Some(&w), Component::LateFee), Decimal::ZERO);
        assert_eq!(adjusted_demand(&p, Some(&w), Component::Interest), dec!(5_000));
        assert_eq!(adjusted_demand(&p, Some(&w), Component::Principal), dec!(40_000));
        assert_eq!(adjusted_demand(&p, None, Component::LateFee), dec!(20_000));
    }

    #[test]
    fn test_honor_waiver_waits_for_reduced_demand() {
        let mut p = payment();
        let w = waiver();
        assert!(honor_waiver(&mut p, &w).is_none());

        p.paid = ComponentAmounts::new(Decimal::ZERO, dec!(5_000), dec!(40_000));
        let applied = honor_waiver(&mut p, &w).unwrap();
        assert_eq!(applied.late_fee, dec!(20_000));
        assert_eq!(applied.interest, dec!(5_000));
        assert!(p.is_settled());
    }

    #[test]
    fn test_waiver_validity_window() {
        let req = WaiverRequest {
            id: 1,
            account_id: 1,
            program: "r4".into(),
            valid_until: date(2024, 2, 1),
            payment_waivers: vec![waiver()],
        };
        assert!(req.is_active(date(2024, 2, 1)));
        assert!(!req.is_active(date(2024, 2, 2)));
        assert!(req.waiver_for(7).is_some());
        assert!(req.waiver_for(8).is_none());
    }
}
