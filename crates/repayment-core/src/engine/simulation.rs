use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::payment_flow::{PaymentProcessor, RepaymentOutcome};
use crate::config::RepaymentConfig;
use crate::hooks::{OperatorAlert, RecordingSink, SideEffect};
use crate::model::PaybackTransaction;
use crate::repository::{InMemoryRepository, LedgerSnapshot};
use crate::types::*;
use crate::RepaymentResult;

/// A ledger plus a batch of repayments to replay against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    #[serde(default)]
    pub config: RepaymentConfig,
    pub ledger: LedgerSnapshot,
    pub transactions: Vec<PaybackTransaction>,
    /// Side-effect kinds whose collaborator should be treated as down.
    #[serde(default)]
    pub failing_effects: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResult {
    pub transaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RepaymentOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub results: Vec<TransactionResult>,
    pub ledger: LedgerSnapshot,
    pub dispatched_effects: Vec<SideEffect>,
    pub operator_alerts: Vec<OperatorAlert>,
}

/// Replay `input.transactions` in order. A failed transaction is reported and
/// leaves the ledger untouched; the batch carries on.
pub fn simulate(input: &SimulationInput) -> RepaymentResult<ComputationOutput<SimulationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut repo = InMemoryRepository::from_snapshot(input.ledger.clone())?;
    let mut sink = RecordingSink {
        failing_kinds: input.failing_effects.clone(),
        ..RecordingSink::default()
    };
    let processor = PaymentProcessor::new(input.config.clone());

    let mut results: Vec<TransactionResult> = Vec::with_capacity(input.transactions.len());
    for trx in &input.transactions {
        match processor.process_transaction(&mut repo, &mut sink, trx) {
            Ok(outcome) => results.push(TransactionResult {
                transaction_id: trx.transaction_id.clone(),
                outcome: Some(outcome),
                error: None,
            }),
            Err(e) => {
                warnings.push(format!("Transaction {} rejected: {}", trx.transaction_id, e));
                results.push(TransactionResult {
                    transaction_id: trx.transaction_id.clone(),
                    outcome: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let output = SimulationOutput {
        results,
        ledger: repo.snapshot(),
        dispatched_effects: sink.dispatched,
        operator_alerts: sink.alerts,
    };

    Ok(with_metadata(
        "Per-transaction unit of work over an in-memory ledger; side effects flushed after commit",
        &input.config,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))
}
