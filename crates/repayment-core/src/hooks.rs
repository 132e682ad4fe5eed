//! Execute-after-commit side effects.
//!
//! The payment flow never talks to notification or collection collaborators
//! while its unit of work is open. It queues [`SideEffect`]s on a
//! [`CommitHooks`] which is either flushed to a [`SideEffectSink`] once the
//! repository commit succeeded, or discarded with the rolled-back work.
//! Dispatch is fire-and-forget: failures are logged, never retried, and never
//! undo the commit.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::RepaymentError;
use crate::model::LoanStatus;
use crate::types::*;
use crate::RepaymentResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideEffect {
    /// An instalment was paid off on time; re-check cashback eligibility.
    CashbackEligibilityCheck {
        account_id: AccountId,
        payment_id: PaymentId,
    },
    /// Collection risk bucket membership, driven by the first instalment.
    CollectionBucketUpdate {
        account_id: AccountId,
        loan_id: LoanId,
        first_installment_paid: bool,
    },
    /// One notification per loan whose status changed, however many hops.
    LoanStatusNotification {
        loan_id: LoanId,
        from: LoanStatus,
        to: LoanStatus,
        hops: usize,
    },
    CheckoutRequestFulfillment {
        account_id: AccountId,
        checkout_request_id: String,
        transaction_id: String,
    },
    OverpaymentNotification {
        account_id: AccountId,
        transaction_id: String,
        amount: Money,
    },
}

impl SideEffect {
    pub fn kind(&self) -> &'static str {
        match self {
            SideEffect::CashbackEligibilityCheck { .. } => "cashback_eligibility_check",
            SideEffect::CollectionBucketUpdate { .. } => "collection_bucket_update",
            SideEffect::LoanStatusNotification { .. } => "loan_status_notification",
            SideEffect::CheckoutRequestFulfillment { .. } => "checkout_request_fulfillment",
            SideEffect::OverpaymentNotification { .. } => "overpayment_notification",
        }
    }
}

/// Raised to the operator channel when a customer-facing effect fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorAlert {
    pub kind: String,
    pub context: serde_json::Value,
    pub error: String,
}

pub trait SideEffectSink {
    fn dispatch(&mut self, effect: &SideEffect) -> RepaymentResult<()>;

    fn alert_operator(&mut self, alert: OperatorAlert);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlushReport {
    pub dispatched: usize,
    pub failed: usize,
}

/// Effects waiting for the surrounding unit of work to commit.
#[derive(Debug, Default)]
pub struct CommitHooks {
    pending: Vec<SideEffect>,
}

impl CommitHooks {
    pub fn new() -> Self {
        CommitHooks::default()
    }

    pub fn on_commit(&mut self, effect: SideEffect) {
        self.pending.push(effect);
    }

    pub fn pending(&self) -> &[SideEffect] {
        &self.pending
    }

    /// Drop everything queued; used when the unit of work rolls back.
    pub fn discard(self) -> usize {
        let dropped = self.pending.len();
        if dropped > 0 {
            warn!(dropped, "discarding side effects of rolled back unit of work");
        }
        dropped
    }

    /// Dispatch every queued effect in order. Must only be called after commit.
    pub fn flush(self, sink: &mut dyn SideEffectSink) -> FlushReport {
        let mut report = FlushReport::default();
        for effect in self.pending {
            match sink.dispatch(&effect) {
                Ok(()) => {
                    debug!(kind = effect.kind(), "side effect dispatched");
                    report.dispatched += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    error!(kind = effect.kind(), error = %e, "post-commit side effect failed");
                    if let SideEffect::OverpaymentNotification { .. } = effect {
                        sink.alert_operator(OperatorAlert {
                            kind: effect.kind().to_string(),
                            context: serde_json::to_value(&effect).unwrap_or_default(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
        report
    }
}

/// Sink that records what it was asked to do. Effects whose kind is listed in
/// `failing_kinds` are rejected instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingSink {
    pub dispatched: Vec<SideEffect>,
    pub alerts: Vec<OperatorAlert>,
    #[serde(default)]
    pub failing_kinds: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink::default()
    }

    pub fn failing(kinds: &[&str]) -> Self {
        RecordingSink {
            failing_kinds: kinds.iter().map(|k| k.to_string()).collect(),
            ..RecordingSink::default()
        }
    }

    pub fn count(&self, kind: &str) -> usize {
        self.dispatched.iter().filter(|e| e.kind() == kind).count()
    }
}

impl SideEffectSink for RecordingSink {
    fn dispatch(&mut self, effect: &SideEffect) -> RepaymentResult<()> {
        if self.failing_kinds.iter().any(|k| k == effect.kind()) {
            return Err(RepaymentError::SideEffect(format!(
                "{} collaborator unavailable",
                effect.kind()
            )));
        }
        self.dispatched.push(effect.clone());
        Ok(())
    }

    fn alert_operator(&mut self, alert: OperatorAlert) {
        self.alerts.push(alert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn overpayment() -> SideEffect {
        SideEffect::OverpaymentNotification {
            account_id: 1,
            transaction_id: "trx-1".into(),
            amount: dec!(5_000),
        }
    }

    #[test]
    fn test_flush_dispatches_in_order() {
        let mut hooks = CommitHooks::new();
        hooks.on_commit(SideEffect::CashbackEligibilityCheck {
            account_id: 1,
            payment_id: 2,
        });
        hooks.on_commit(overpayment());
        let mut sink = RecordingSink::new();
        let report = hooks.flush(&mut sink);
        assert_eq!(report.dispatched, 2);
        assert_eq!(sink.dispatched[0].kind(), "cashback_eligibility_check");
        assert_eq!(sink.dispatched[1].kind(), "overpayment_notification");
    }

    #[test]
    fn test_failed_overpayment_raises_operator_alert() {
        let mut hooks = CommitHooks::new();
        hooks.on_commit(overpayment());
        let mut sink = RecordingSink::failing(&["overpayment_notification"]);
        let report = hooks.flush(&mut sink);
        assert_eq!(report.failed, 1);
        assert!(sink.dispatched.is_empty());
        assert_eq!(sink.alerts.len(), 1);
        assert_eq!(sink.alerts[0].kind, "overpayment_notification");
    }

    #[test]
    fn test_discard_dispatches_nothing() {
        let mut hooks = CommitHooks::new();
        hooks.on_commit(overpayment());
        assert_eq!(hooks.discard(), 1);
    }
}
