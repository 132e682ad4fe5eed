use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RepaymentError;
use crate::model::{AccountPayment, AccountPaymentStatus, Payment, PaymentStatus};
use crate::RepaymentResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidStatusInput {
    pub due_date: NaiveDate,
    pub paid_date: NaiveDate,
    pub grace_period_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaidStatusOutput {
    pub status: PaymentStatus,
    pub status_code: u16,
    pub days_late: i64,
}

/// Terminal sub-status for an instalment paid off on `paid_date`.
pub fn resolve_paid_status(
    due_date: NaiveDate,
    paid_date: NaiveDate,
    grace_period_days: i64,
) -> PaymentStatus {
    let days_late = (paid_date - due_date).num_days();
    if days_late <= 0 {
        PaymentStatus::PaidOnTime
    } else if days_late <= grace_period_days {
        PaymentStatus::PaidWithinGrace
    } else {
        PaymentStatus::PaidLate
    }
}

pub fn evaluate_paid_status(input: &PaidStatusInput) -> RepaymentResult<PaidStatusOutput> {
    if input.grace_period_days < 0 {
        return Err(RepaymentError::InvalidInput {
            field: "grace_period_days".into(),
            reason: "Grace period cannot be negative".into(),
        });
    }
    let status = resolve_paid_status(input.due_date, input.paid_date, input.grace_period_days);
    Ok(PaidStatusOutput {
        status,
        status_code: status.code(),
        days_late: (input.paid_date - input.due_date).num_days().max(0),
    })
}

/// Re-evaluate an instalment after money was applied on `as_of`.
///
/// Returns true when this call moved the instalment into a paid status.
pub fn refresh_payment_status(payment: &mut Payment, as_of: NaiveDate, grace_period_days: i64) -> bool {
    if payment.is_settled() {
        if payment.status.is_paid() {
            return false;
        }
        payment.paid_date = Some(as_of);
        payment.status = resolve_paid_status(payment.due_date, as_of, grace_period_days);
        true
    } else {
        payment.status = PaymentStatus::for_unpaid(payment.due_date, as_of);
        false
    }
}

/// Re-aggregate an account payment from its instalments.
///
/// Paid off only when every instalment is paid; otherwise partially paid if
/// anything has been paid at all.
pub fn refresh_account_payment(
    account_payment: &mut AccountPayment,
    payments: &[Payment],
    grace_period_days: i64,
) -> RepaymentResult<AccountPaymentStatus> {
    let mut members: Vec<&Payment> = Vec::with_capacity(account_payment.payment_ids.len());
    for id in &account_payment.payment_ids {
        let payment = payments.iter().find(|p| p.id == *id).ok_or_else(|| {
            RepaymentError::not_found("payment", format!("{id} of account payment {}", account_payment.id))
        })?;
        members.push(payment);
    }

    account_payment.due_amount = members.iter().map(|p| p.due_amount()).sum();
    account_payment.paid_amount = members.iter().map(|p| p.paid_amount()).sum();

    let all_paid = !members.is_empty() && members.iter().all(|p| p.status.is_paid());
    account_payment.status = if all_paid {
        let paid_date = members
            .iter()
            .filter_map(|p| p.paid_date)
            .max()
            .unwrap_or(account_payment.due_date);
        account_payment.paid_date = Some(paid_date);
        match resolve_paid_status(account_payment.due_date, paid_date, grace_period_days) {
            PaymentStatus::PaidOnTime => AccountPaymentStatus::PaidOnTime,
            PaymentStatus::PaidWithinGrace => AccountPaymentStatus::PaidWithinGrace,
            _ => AccountPaymentStatus::PaidLate,
        }
    } else if account_payment.paid_amount > Decimal::ZERO
        || members.iter().any(|p| !p.waived.is_zero())
    {
        AccountPaymentStatus::PartiallyPaid
    } else {
        AccountPaymentStatus::Unpaid
    };

    Ok(account_payment.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentAmounts;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payment(id: u64, outstanding_principal: Decimal) -> Payment {
        Payment {
            id,
            loan_id: id,
            account_payment_id: Some(50),
            payment_number: 1,
            due_date: date(2024, 5, 10),
            billed: ComponentAmounts::new(Decimal::ZERO, dec!(1_000), dec!(9_000)),
            paid: ComponentAmounts::new(Decimal::ZERO, dec!(1_000), dec!(9_000) - outstanding_principal),
            waived: ComponentAmounts::default(),
            paid_date: None,
            status: PaymentStatus::DueToday,
        }
    }

    fn account_payment() -> AccountPayment {
        AccountPayment {
            id: 50,
            account_id: 1,
            due_date: date(2024, 5, 10),
            due_amount: dec!(20_000),
            paid_amount: Decimal::ZERO,
            paid_date: None,
            status: AccountPaymentStatus::Unpaid,
            payment_ids: vec![1, 2],
        }
    }

    #[test]
    fn test_resolve_paid_status_windows() {
        let due = date(2024, 5, 10);
        assert_eq!(resolve_paid_status(due, date(2024, 5, 1), 5), PaymentStatus::PaidOnTime);
        assert_eq!(resolve_paid_status(due, due, 5), PaymentStatus::PaidOnTime);
        assert_eq!(resolve_paid_status(due, date(2024, 5, 15), 5), PaymentStatus::PaidWithinGrace);
        assert_eq!(resolve_paid_status(due, date(2024, 5, 16), 5), PaymentStatus::PaidLate);
    }

    #[test]
    fn test_refresh_payment_marks_paid_once() {
        let mut p = payment(1, Decimal::ZERO);
        assert!(refresh_payment_status(&mut p, date(2024, 5, 12), 5));
        assert_eq!(p.status, PaymentStatus::PaidWithinGrace);
        assert_eq!(p.paid_date, Some(date(2024, 5, 12)));
        assert!(!refresh_payment_status(&mut p, date(2024, 6, 1), 5));
    }

    #[test]
    fn test_account_payment_partially_paid_until_all_instalments_paid() {
        let mut p1 = payment(1, Decimal::ZERO);
        let mut p2 = payment(2, dec!(4_000));
        refresh_payment_status(&mut p1, date(2024, 5, 9), 5);
        refresh_payment_status(&mut p2, date(2024, 5, 9), 5);

        let mut ap = account_payment();
        let status = refresh_account_payment(&mut ap, &[p1.clone(), p2.clone()], 5).unwrap();
        assert_eq!(status, AccountPaymentStatus::PartiallyPaid);
        assert_eq!(ap.due_amount, dec!(4_000));
        assert_eq!(ap.paid_amount, dec!(16_000));

        let mut p2 = payment(2, Decimal::ZERO);
        refresh_payment_status(&mut p2, date(2024, 5, 20), 5);
        let status = refresh_account_payment(&mut ap, &[p1, p2], 5).unwrap();
        assert_eq!(status, AccountPaymentStatus::PaidLate);
        assert_eq!(ap.due_amount, Decimal::ZERO);
        assert_eq!(ap.paid_date, Some(date(2024, 5, 20)));
    }

    #[test]
    fn test_account_payment_missing_instalment_is_an_error() {
        let mut ap = account_payment();
        assert!(refresh_account_payment(&mut ap, &[payment(1, Decimal::ZERO)], 5).is_err());
    }

    #[test]
    fn test_evaluate_rejects_negative_grace() {
        let input = PaidStatusInput {
            due_date: date(2024, 1, 1),
            paid_date: date(2024, 1, 2),
            grace_period_days: -1,
        };
        assert!(evaluate_paid_status(&input).is_err());
    }
}
