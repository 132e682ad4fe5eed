use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hooks::SideEffect;
use crate::model::{Account, PaybackTransaction};
use crate::types::*;

pub const OVERPAID_CASHBACK_REASON: &str = "cashback_over_paid";

/// Surplus of one repayment, credited to the customer's cashback wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverpaymentCredit {
    pub account_id: AccountId,
    pub transaction_id: String,
    pub amount: Money,
    pub credited_on: NaiveDate,
    pub reason: String,
}

impl OverpaymentCredit {
    pub fn notification(&self) -> SideEffect {
        SideEffect::OverpaymentNotification {
            account_id: self.account_id,
            transaction_id: self.transaction_id.clone(),
            amount: self.amount,
        }
    }
}

/// Credit `remaining` to the account wallet. Nothing happens when the
/// repayment was fully consumed.
pub fn route_overpayment(
    account: &mut Account,
    transaction: &PaybackTransaction,
    remaining: Money,
) -> Option<OverpaymentCredit> {
    if remaining <= Decimal::ZERO {
        return None;
    }
    account.cashback_balance += remaining;
    Some(OverpaymentCredit {
        account_id: account.id,
        transaction_id: transaction.transaction_id.clone(),
        amount: remaining,
        credited_on: transaction.transaction_date,
        reason: OVERPAID_CASHBACK_REASON.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepaymentSource;
    use rust_decimal_macros::dec;

    fn transaction() -> PaybackTransaction {
        PaybackTransaction {
            transaction_id: "va-001".into(),
            account_id: 4,
            amount: dec!(105_000),
            transaction_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            source: RepaymentSource::BankTransfer { bank: "BCA".into() },
            checkout_request_id: None,
        }
    }

    #[test]
    fn test_surplus_goes_to_wallet() {
        let mut account = Account {
            id: 4,
            customer_id: 40,
            cashback_balance: dec!(1_000),
        };
        let credit = route_overpayment(&mut account, &transaction(), dec!(5_000)).unwrap();
        assert_eq!(credit.amount, dec!(5_000));
        assert_eq!(account.cashback_balance, dec!(6_000));
        assert_eq!(credit.notification().kind(), "overpayment_notification");
    }

    #[test]
    fn test_no_surplus_no_credit() {
        let mut account = Account {
            id: 4,
            customer_id: 40,
            cashback_balance: Decimal::ZERO,
        };
        assert!(route_overpayment(&mut account, &transaction(), Decimal::ZERO).is_none());
        assert_eq!(account.cashback_balance, Decimal::ZERO);
    }
}
