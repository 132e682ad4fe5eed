//! Loan status reconciliation.
//!
//! Takes a batch of `(loan_id, status_code)` updates, keeps only the latest
//! status per loan and applies each loan in its own unit of work. However many
//! hops a loan walked through in the batch, it gets exactly one status
//! notification after its commit. A bad entry fails only its own loan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

use crate::error::RepaymentError;
use crate::hooks::{CommitHooks, SideEffect, SideEffectSink};
use crate::model::LoanStatus;
use crate::repository::{ChangeSet, RepaymentRepository};
use crate::types::*;
use crate::RepaymentResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanStatusUpdate {
    pub loan_id: LoanId,
    pub status_code: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedTransition {
    pub loan_id: LoanId,
    pub from: LoanStatus,
    pub to: LoanStatus,
    /// Entries for this loan in the batch.
    pub hops: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLoan {
    pub loan_id: LoanId,
    pub status: LoanStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLoan {
    pub loan_id: LoanId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub applied: Vec<AppliedTransition>,
    /// Loans already at their latest status; no notification sent.
    pub skipped: Vec<SkippedLoan>,
    pub failed: Vec<FailedLoan>,
    pub notifications: usize,
}

/// Collapse the batch to the last status per loan, in first-seen loan order.
pub fn latest_per_loan(updates: &[LoanStatusUpdate]) -> Vec<(LoanId, u16, usize)> {
    let mut order: Vec<LoanId> = Vec::new();
    let mut latest: HashMap<LoanId, (u16, usize)> = HashMap::new();
    for update in updates {
        let entry = latest.entry(update.loan_id).or_insert_with(|| {
            order.push(update.loan_id);
            (update.status_code, 0)
        });
        entry.0 = update.status_code;
        entry.1 += 1;
    }
    order
        .into_iter()
        .filter_map(|id| latest.get(&id).map(|(code, hops)| (id, *code, *hops)))
        .collect()
}

#[instrument(name = "repayment.reconcile_loan_statuses", skip_all, fields(updates = updates.len()))]
pub fn reconcile_loan_statuses<R: RepaymentRepository + ?Sized>(
    repo: &mut R,
    sink: &mut dyn SideEffectSink,
    updates: &[LoanStatusUpdate],
) -> RepaymentResult<ReconciliationReport> {
    if updates.is_empty() {
        return Err(RepaymentError::InvalidInput {
            field: "updates".into(),
            reason: "At least one loan status update is required".into(),
        });
    }

    let mut report = ReconciliationReport::default();
    for (loan_id, code, hops) in latest_per_loan(updates) {
        match apply_one(repo, loan_id, code) {
            Ok(Some((from, to))) => {
                let mut hooks = CommitHooks::new();
                hooks.on_commit(SideEffect::LoanStatusNotification {
                    loan_id,
                    from,
                    to,
                    hops,
                });
                let flushed = hooks.flush(sink);
                report.notifications += flushed.dispatched;
                report.applied.push(AppliedTransition {
                    loan_id,
                    from,
                    to,
                    hops,
                });
            }
            Ok(None) => {
                let status = LoanStatus::from_code(code)?;
                report.skipped.push(SkippedLoan { loan_id, status });
            }
            Err(e) => {
                warn!(loan_id, error = %e, "loan status update rejected");
                report.failed.push(FailedLoan {
                    loan_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        applied = report.applied.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "loan status batch reconciled"
    );
    Ok(report)
}

/// Returns the transition made, or `None` if the loan already had `code`.
fn apply_one<R: RepaymentRepository + ?Sized>(
    repo: &mut R,
    loan_id: LoanId,
    code: u16,
) -> RepaymentResult<Option<(LoanStatus, LoanStatus)>> {
    let target = LoanStatus::from_code(code)?;
    let mut loan = repo.loan(loan_id)?;
    let from = loan.status;
    if from == target {
        return Ok(None);
    }
    if !from.can_transition_to(target) {
        return Err(RepaymentError::InvalidTransition {
            loan_id,
            from: from.code(),
            to: target.code(),
        });
    }
    loan.status = target;
    repo.commit(ChangeSet {
        loans: vec![loan],
        ..ChangeSet::default()
    })?;
    Ok(Some((from, target)))
}

#[cfg(feature = "engine")]
pub use batch::*;

#[cfg(feature = "engine")]
mod batch {
    use super::*;
    use crate::hooks::RecordingSink;
    use crate::repository::{InMemoryRepository, LedgerSnapshot};
    use std::time::Instant;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReconciliationInput {
        pub ledger: LedgerSnapshot,
        pub updates: Vec<LoanStatusUpdate>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReconciliationOutput {
        pub report: ReconciliationReport,
        pub ledger: LedgerSnapshot,
        pub dispatched_effects: Vec<SideEffect>,
    }

    /// Reconcile a batch against an in-memory copy of `input.ledger`.
    pub fn reconcile(input: &ReconciliationInput) -> RepaymentResult<ComputationOutput<ReconciliationOutput>> {
        let start = Instant::now();
        let mut repo = InMemoryRepository::from_snapshot(input.ledger.clone())?;
        let mut sink = RecordingSink::new();
        let report = reconcile_loan_statuses(&mut repo, &mut sink, &input.updates)?;

        let warnings: Vec<String> = report
            .failed
            .iter()
            .map(|f| format!("Loan {}: {}", f.loan_id, f.reason))
            .collect();
        let assumptions = serde_json::json!({
            "dedupe": "last entry per loan wins",
            "notifications": "one per changed loan",
        });

        Ok(with_metadata(
            "Latest-status-per-loan reconciliation with one unit of work per loan",
            &assumptions,
            warnings,
            start.elapsed().as_micros() as u64,
            ReconciliationOutput {
                report,
                ledger: repo.snapshot(),
                dispatched_effects: sink.dispatched,
            },
        ))
    }
}
