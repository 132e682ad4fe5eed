use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::{ChangeSet, LedgerSnapshot, RepaymentRepository};
use crate::allocation::WaiverRequest;
use crate::error::RepaymentError;
use crate::model::{Account, AccountPayment, Loan, PaybackTransaction, Payment};
use crate::overpayment::OverpaymentCredit;
use crate::types::*;
use crate::RepaymentResult;

/// Repository backed by ordered maps. Commits validate the whole change set
/// before writing anything.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    accounts: BTreeMap<AccountId, Account>,
    loans: BTreeMap<LoanId, Loan>,
    account_payments: BTreeMap<AccountPaymentId, AccountPayment>,
    payments: BTreeMap<PaymentId, Payment>,
    waivers: Vec<WaiverRequest>,
    transactions: BTreeMap<String, PaybackTransaction>,
    overpayments: Vec<OverpaymentCredit>,
    fail_commits: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        InMemoryRepository::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> RepaymentResult<Self> {
        let mut repo = InMemoryRepository::new();
        for account in snapshot.accounts {
            insert_unique(&mut repo.accounts, account.id, account, "account")?;
        }
        for loan in snapshot.loans {
            insert_unique(&mut repo.loans, loan.id, loan, "loan")?;
        }
        for payment in snapshot.payments {
            payment.validate()?;
            insert_unique(&mut repo.payments, payment.id, payment, "payment")?;
        }
        let mut billed: BTreeSet<PaymentId> = BTreeSet::new();
        for ap in snapshot.account_payments {
            for id in &ap.payment_ids {
                let payment = repo.payments.get(id).ok_or_else(|| {
                    RepaymentError::not_found("payment", format!("{id} of account payment {}", ap.id))
                })?;
                if !billed.insert(*id) {
                    return Err(RepaymentError::InvalidInput {
                        field: format!("account_payment.{}.payment_ids", ap.id),
                        reason: format!("Payment {id} is billed more than once"),
                    });
                }
                if payment.account_payment_id != Some(ap.id) {
                    return Err(RepaymentError::InvalidInput {
                        field: format!("payment.{id}.account_payment_id"),
                        reason: format!("Payment {id} is listed by account payment {} it does not belong to", ap.id),
                    });
                }
            }
            insert_unique(&mut repo.account_payments, ap.id, ap, "account payment")?;
        }
        for waiver in &snapshot.waivers {
            waiver.validate()?;
        }
        repo.waivers = snapshot.waivers;
        for trx in snapshot.transactions {
            let key = trx.transaction_id.clone();
            if repo.transactions.insert(key.clone(), trx).is_some() {
                return Err(RepaymentError::DuplicateTransaction(key));
            }
        }
        repo.overpayments = snapshot.overpayments;
        Ok(repo)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self.accounts.values().cloned().collect(),
            loans: self.loans.values().cloned().collect(),
            account_payments: self.account_payments.values().cloned().collect(),
            payments: self.payments.values().cloned().collect(),
            waivers: self.waivers.clone(),
            transactions: self.transactions.values().cloned().collect(),
            overpayments: self.overpayments.clone(),
        }
    }

    /// Make every following commit fail, to exercise rollback paths.
    pub fn fail_commits(&mut self, fail: bool) {
        self.fail_commits = fail;
    }

    pub fn add_waiver(&mut self, waiver: WaiverRequest) -> RepaymentResult<()> {
        waiver.validate()?;
        self.waivers.push(waiver);
        Ok(())
    }

    pub fn payment(&self, id: PaymentId) -> RepaymentResult<Payment> {
        self.payments
            .get(&id)
            .cloned()
            .ok_or_else(|| RepaymentError::not_found("payment", id))
    }

    pub fn account_payment(&self, id: AccountPaymentId) -> RepaymentResult<AccountPayment> {
        self.account_payments
            .get(&id)
            .cloned()
            .ok_or_else(|| RepaymentError::not_found("account payment", id))
    }

    pub fn overpayments(&self) -> &[OverpaymentCredit] {
        &self.overpayments
    }

    fn check_exists(&self, changes: &ChangeSet) -> RepaymentResult<()> {
        if let Some(a) = changes.accounts.iter().find(|a| !self.accounts.contains_key(&a.id)) {
            return Err(RepaymentError::not_found("account", a.id));
        }
        if let Some(l) = changes.loans.iter().find(|l| !self.loans.contains_key(&l.id)) {
            return Err(RepaymentError::not_found("loan", l.id));
        }
        if let Some(ap) = changes
            .account_payments
            .iter()
            .find(|ap| !self.account_payments.contains_key(&ap.id))
        {
            return Err(RepaymentError::not_found("account payment", ap.id));
        }
        if let Some(p) = changes.payments.iter().find(|p| !self.payments.contains_key(&p.id)) {
            return Err(RepaymentError::not_found("payment", p.id));
        }
        Ok(())
    }
}

fn insert_unique<T>(map: &mut BTreeMap<u64, T>, id: u64, value: T, entity: &str) -> RepaymentResult<()> {
    if map.insert(id, value).is_some() {
        return Err(RepaymentError::InvalidInput {
            field: entity.replace(' ', "_"),
            reason: format!("Duplicate {entity} id {id}"),
        });
    }
    Ok(())
}

impl RepaymentRepository for InMemoryRepository {
    fn account(&self, id: AccountId) -> RepaymentResult<Account> {
        self.accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| RepaymentError::not_found("account", id))
    }

    fn loan(&self, id: LoanId) -> RepaymentResult<Loan> {
        self.loans
            .get(&id)
            .cloned()
            .ok_or_else(|| RepaymentError::not_found("loan", id))
    }

    fn unpaid_account_payments(&self, account_id: AccountId) -> RepaymentResult<Vec<AccountPayment>> {
        let mut unpaid: Vec<AccountPayment> = self
            .account_payments
            .values()
            .filter(|ap| ap.account_id == account_id && !ap.is_paid())
            .cloned()
            .collect();
        unpaid.sort_by_key(|ap| (ap.due_date, ap.id));
        Ok(unpaid)
    }

    fn payments(&self, ids: &[PaymentId]) -> RepaymentResult<Vec<Payment>> {
        ids.iter().map(|id| self.payment(*id)).collect()
    }

    fn loan_payments(&self, loan_id: LoanId) -> RepaymentResult<Vec<Payment>> {
        let mut own: Vec<Payment> = self
            .payments
            .values()
            .filter(|p| p.loan_id == loan_id)
            .cloned()
            .collect();
        own.sort_by_key(|p| (p.due_date, p.payment_number));
        Ok(own)
    }

    fn active_waiver(&self, account_id: AccountId, on: NaiveDate) -> RepaymentResult<Option<WaiverRequest>> {
        Ok(self
            .waivers
            .iter()
            .filter(|w| w.account_id == account_id && w.is_active(on))
            .max_by_key(|w| w.id)
            .cloned())
    }

    fn is_transaction_recorded(&self, transaction_id: &str) -> RepaymentResult<bool> {
        Ok(self.transactions.contains_key(transaction_id))
    }

    fn commit(&mut self, changes: ChangeSet) -> RepaymentResult<()> {
        if self.fail_commits {
            return Err(RepaymentError::Repository("commit refused".into()));
        }
        if let Some(trx) = &changes.transaction {
            if self.transactions.contains_key(&trx.transaction_id) {
                return Err(RepaymentError::DuplicateTransaction(trx.transaction_id.clone()));
            }
        }
        self.check_exists(&changes)?;

        for account in changes.accounts {
            self.accounts.insert(account.id, account);
        }
        for loan in changes.loans {
            self.loans.insert(loan.id, loan);
        }
        for ap in changes.account_payments {
            self.account_payments.insert(ap.id, ap);
        }
        for payment in changes.payments {
            self.payments.insert(payment.id, payment);
        }
        if let Some(credit) = changes.overpayment {
            self.overpayments.push(credit);
        }
        if let Some(trx) = changes.transaction {
            self.transactions.insert(trx.transaction_id.clone(), trx);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountPaymentStatus, LoanStatus, RepaymentSource};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot() -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: vec![Account {
                id: 1,
                customer_id: 11,
                cashback_balance: dec!(0),
            }],
            loans: vec![Loan {
                id: 2,
                account_id: 1,
                principal: dec!(100),
                status: LoanStatus::Current,
            }],
            account_payments: vec![
                AccountPayment {
                    id: 20,
                    account_id: 1,
                    due_date: date(2024, 2, 1),
                    due_amount: dec!(0),
                    paid_amount: dec!(0),
                    paid_date: None,
                    status: AccountPaymentStatus::Unpaid,
                    payment_ids: vec![],
                },
                AccountPayment {
                    id: 10,
                    account_id: 1,
                    due_date: date(2024, 1, 1),
                    due_amount: dec!(0),
                    paid_amount: dec!(0),
                    paid_date: None,
                    status: AccountPaymentStatus::Unpaid,
                    payment_ids: vec![],
                },
            ],
            ..LedgerSnapshot::default()
        }
    }

    fn trx(id: &str) -> PaybackTransaction {
        PaybackTransaction {
            transaction_id: id.into(),
            account_id: 1,
            amount: dec!(10),
            transaction_date: date(2024, 1, 2),
            source: RepaymentSource::Autodebet { vendor: "BRI".into() },
            checkout_request_id: None,
        }
    }

    #[test]
    fn test_unpaid_account_payments_oldest_first() {
        let repo = InMemoryRepository::from_snapshot(snapshot()).unwrap();
        let unpaid = repo.unpaid_account_payments(1).unwrap();
        assert_eq!(unpaid.iter().map(|ap| ap.id).collect::<Vec<_>>(), vec![10, 20]);
    }

    #[test]
    fn test_duplicate_transaction_rejected_at_commit() {
        let mut repo = InMemoryRepository::from_snapshot(snapshot()).unwrap();
        repo.commit(ChangeSet {
            transaction: Some(trx("t-1")),
            ..ChangeSet::default()
        })
        .unwrap();
        let err = repo
            .commit(ChangeSet {
                transaction: Some(trx("t-1")),
                ..ChangeSet::default()
            })
            .unwrap_err();
        assert!(matches!(err, RepaymentError::DuplicateTransaction(_)));
    }

    #[test]
    fn test_commit_is_all_or_nothing() {
        let mut repo = InMemoryRepository::from_snapshot(snapshot()).unwrap();
        let mut account = repo.account(1).unwrap();
        account.cashback_balance = dec!(99);
        let ghost = Loan {
            id: 404,
            account_id: 1,
            principal: dec!(1),
            status: LoanStatus::Current,
        };
        let res = repo.commit(ChangeSet {
            transaction: Some(trx("t-2")),
            accounts: vec![account],
            loans: vec![ghost],
            ..ChangeSet::default()
        });
        assert!(res.is_err());
        assert_eq!(repo.account(1).unwrap().cashback_balance, dec!(0));
        assert!(!repo.is_transaction_recorded("t-2").unwrap());
    }

    fn instalment(id: u64, account_payment_id: u64) -> Payment {
        Payment {
            id,
            loan_id: 2,
            account_payment_id: Some(account_payment_id),
            payment_number: 1,
            due_date: date(2024, 1, 1),
            billed: crate::types::ComponentAmounts::new(dec!(0), dec!(10_000), dec!(40_000)),
            paid: Default::default(),
            waived: Default::default(),
            paid_date: None,
            status: Default::default(),
        }
    }

    #[test]
    fn test_snapshot_rejects_instalment_billed_twice_in_one_account_payment() {
        let mut snap = snapshot();
        snap.payments = vec![instalment(1, 10)];
        snap.account_payments[1].payment_ids = vec![1, 1];
        let err = InMemoryRepository::from_snapshot(snap).unwrap_err();
        assert!(matches!(err, RepaymentError::InvalidInput { .. }));
    }

    #[test]
    fn test_snapshot_rejects_instalment_under_two_account_payments() {
        let mut snap = snapshot();
        snap.payments = vec![instalment(1, 10)];
        snap.account_payments[0].payment_ids = vec![1];
        snap.account_payments[1].payment_ids = vec![1];
        assert!(InMemoryRepository::from_snapshot(snap).is_err());
    }

    #[test]
    fn test_snapshot_rejects_instalment_listed_by_foreign_account_payment() {
        let mut snap = snapshot();
        snap.payments = vec![instalment(1, 10)];
        snap.account_payments[0].payment_ids = vec![1];
        let err = InMemoryRepository::from_snapshot(snap).unwrap_err();
        assert!(err.to_string().contains("does not belong"));
    }

    #[test]
    fn test_snapshot_rejects_dangling_instalment() {
        let mut snap = snapshot();
        snap.account_payments[0].payment_ids = vec![77];
        assert!(InMemoryRepository::from_snapshot(snap).is_err());
    }
}
