//! Payment flow: one incoming repayment event, end to end.
//!
//! 1. Reject invalid or already-recorded transactions.
//! 2. Walk the account's unpaid account payments, oldest first, running the
//!    component waterfall over each one's instalments while money remains.
//! 3. Refresh instalment, account-payment and loan statuses.
//! 4. Credit any surplus to the cashback wallet.
//! 5. Commit one change set, then flush the queued side effects.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::allocation::{allocate, PaymentAllocation};
use crate::config::RepaymentConfig;
use crate::error::RepaymentError;
use crate::hooks::{CommitHooks, FlushReport, SideEffect, SideEffectSink};
use crate::model::{AccountPaymentStatus, PaybackTransaction, Payment, PaymentStatus};
use crate::overpayment::{route_overpayment, OverpaymentCredit};
use crate::repository::{ChangeSet, RepaymentRepository};
use crate::status::{refresh_account_payment, refresh_loan_status, refresh_payment_status, LoanStatusChange};
use crate::types::*;
use crate::RepaymentResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPaymentOutcome {
    pub account_payment_id: AccountPaymentId,
    pub status: AccountPaymentStatus,
    pub due_amount: Money,
    pub paid_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentOutcome {
    pub transaction_id: String,
    pub account_id: AccountId,
    pub amount: Money,
    pub total_paid: ComponentAmounts,
    pub total_waived: ComponentAmounts,
    pub remaining_amount: Money,
    /// Instalments that received money or a waiver write-off.
    pub breakdown: Vec<PaymentAllocation>,
    pub account_payments: Vec<AccountPaymentOutcome>,
    pub loan_status_changes: Vec<LoanStatusChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overpayment: Option<OverpaymentCredit>,
    pub side_effects: Vec<SideEffect>,
    pub flush: FlushReport,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentProcessor {
    config: RepaymentConfig,
}

impl PaymentProcessor {
    pub fn new(config: RepaymentConfig) -> Self {
        PaymentProcessor { config }
    }

    #[instrument(
        name = "repayment.process_transaction",
        skip(self, repo, sink, transaction),
        fields(transaction_id = %transaction.transaction_id, account_id = transaction.account_id, amount = %transaction.amount),
        err
    )]
    pub fn process_transaction<R: RepaymentRepository + ?Sized>(
        &self,
        repo: &mut R,
        sink: &mut dyn SideEffectSink,
        transaction: &PaybackTransaction,
    ) -> RepaymentResult<RepaymentOutcome> {
        transaction.validate()?;
        if repo.is_transaction_recorded(&transaction.transaction_id)? {
            warn!("repayment transaction already processed");
            return Err(RepaymentError::DuplicateTransaction(
                transaction.transaction_id.clone(),
            ));
        }

        let as_of = transaction.transaction_date;
        let grace = self.config.grace_period_days;
        let mut account = repo.account(transaction.account_id)?;
        let waiver = repo.active_waiver(account.id, as_of)?;

        let mut hooks = CommitHooks::new();
        let mut changes = ChangeSet::default();
        let mut remaining = transaction.amount;
        let mut total_paid = ComponentAmounts::default();
        let mut total_waived = ComponentAmounts::default();
        let mut breakdown: Vec<PaymentAllocation> = Vec::new();
        let mut account_payments: Vec<AccountPaymentOutcome> = Vec::new();
        let mut touched: BTreeMap<PaymentId, Payment> = BTreeMap::new();

        for mut account_payment in repo.unpaid_account_payments(account.id)? {
            if remaining <= Decimal::ZERO {
                break;
            }
            let mut members = repo.payments(&account_payment.payment_ids)?;
            for p in members.iter_mut() {
                if let Some(updated) = touched.get(&p.id) {
                    *p = updated.clone();
                }
            }
            let mut unpaid: Vec<Payment> = members
                .iter()
                .filter(|p| !p.is_settled())
                .cloned()
                .collect();
            if unpaid.is_empty() {
                continue;
            }
            unpaid.sort_by_key(|p| (p.due_date, p.payment_number, p.id));
            unpaid.dedup_by_key(|p| p.id);

            let allocation = allocate(&unpaid, remaining, waiver.as_ref())?;
            remaining = allocation.remaining_amount;
            total_paid += allocation.total_paid;
            total_waived += allocation.total_waived;

            for (mut updated, entry) in allocation.payments.into_iter().zip(allocation.breakdown) {
                if !entry.touched() {
                    continue;
                }
                if refresh_payment_status(&mut updated, as_of, grace) {
                    self.queue_payoff_effects(&mut hooks, account.id, &updated);
                } else {
                    updated.paid_date = Some(as_of);
                }
                if let Some(slot) = members.iter_mut().find(|p| p.id == updated.id) {
                    *slot = updated.clone();
                }
                touched.insert(updated.id, updated);
                breakdown.push(entry);
            }

            refresh_account_payment(&mut account_payment, &members, grace)?;
            if account_payment.status == AccountPaymentStatus::PartiallyPaid {
                account_payment.paid_date = Some(as_of);
            }
            account_payments.push(AccountPaymentOutcome {
                account_payment_id: account_payment.id,
                status: account_payment.status,
                due_amount: account_payment.due_amount,
                paid_amount: account_payment.paid_amount,
            });
            changes.account_payments.push(account_payment);
        }

        if total_paid.total() + remaining != transaction.amount {
            return Err(RepaymentError::AllocationInvariant(format!(
                "transaction {} allocated {} with {} remaining out of {}",
                transaction.transaction_id,
                total_paid.total(),
                remaining,
                transaction.amount
            )));
        }

        let mut loan_ids: Vec<LoanId> = touched.values().map(|p| p.loan_id).collect();
        loan_ids.sort_unstable();
        loan_ids.dedup();
        let mut loan_status_changes: Vec<LoanStatusChange> = Vec::new();
        for loan_id in loan_ids {
            let mut loan = repo.loan(loan_id)?;
            let mut loan_payments = repo.loan_payments(loan_id)?;
            for p in loan_payments.iter_mut() {
                if let Some(updated) = touched.get(&p.id) {
                    *p = updated.clone();
                }
            }
            if let Some(change) = refresh_loan_status(&mut loan, &loan_payments, as_of) {
                hooks.on_commit(SideEffect::LoanStatusNotification {
                    loan_id,
                    from: change.from,
                    to: change.to,
                    hops: 1,
                });
                loan_status_changes.push(change);
                changes.loans.push(loan);
            }
        }

        let overpayment = route_overpayment(&mut account, transaction, remaining);
        if let Some(credit) = &overpayment {
            changes.accounts.push(account.clone());
            changes.overpayment = Some(credit.clone());
            if self.config.notify_overpayment {
                hooks.on_commit(credit.notification());
            }
        }

        if let Some(checkout_request_id) = &transaction.checkout_request_id {
            hooks.on_commit(SideEffect::CheckoutRequestFulfillment {
                account_id: account.id,
                checkout_request_id: checkout_request_id.clone(),
                transaction_id: transaction.transaction_id.clone(),
            });
        }

        changes.payments = touched.into_values().collect();
        changes.transaction = Some(transaction.clone());

        if let Err(e) = repo.commit(changes) {
            hooks.discard();
            return Err(e);
        }
        info!(
            source = %transaction.source.label(),
            remaining = %remaining,
            instalments = breakdown.len(),
            "repayment committed"
        );

        let side_effects = hooks.pending().to_vec();
        let flush = hooks.flush(sink);

        Ok(RepaymentOutcome {
            transaction_id: transaction.transaction_id.clone(),
            account_id: account.id,
            amount: transaction.amount,
            total_paid,
            total_waived,
            remaining_amount: remaining,
            breakdown,
            account_payments,
            loan_status_changes,
            overpayment,
            side_effects,
            flush,
        })
    }

    /// Payoffs closed purely by a waiver write-off queue nothing.
    fn queue_payoff_effects(&self, hooks: &mut CommitHooks, account_id: AccountId, payment: &Payment) {
        if payment.paid_amount() <= Decimal::ZERO {
            return;
        }
        if self.config.cashback_check_enabled && payment.status == PaymentStatus::PaidOnTime {
            hooks.on_commit(SideEffect::CashbackEligibilityCheck {
                account_id,
                payment_id: payment.id,
            });
        }
        if payment.payment_number == 1 {
            hooks.on_commit(SideEffect::CollectionBucketUpdate {
                account_id,
                loan_id: payment.loan_id,
                first_installment_paid: true,
            });
        }
    }
}
