use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepaymentError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Duplicate transaction: {0} has already been processed")]
    DuplicateTransaction(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: String },

    #[error("Invalid status transition for loan {loan_id}: {from} -> {to}")]
    InvalidTransition { loan_id: u64, from: u16, to: u16 },

    #[error("Allocation invariant violated: {0}")]
    AllocationInvariant(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Side effect failed: {0}")]
    SideEffect(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepaymentError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        RepaymentError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for RepaymentError {
    fn from(e: serde_json::Error) -> Self {
        RepaymentError::Serialization(e.to_string())
    }
}
