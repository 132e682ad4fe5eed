pub mod allocation;
pub mod config;
pub mod error;
pub mod hooks;
pub mod model;
pub mod overpayment;
pub mod repository;
pub mod status;
pub mod types;

#[cfg(feature = "engine")]
pub mod engine;

#[cfg(feature = "reconciliation")]
pub mod reconciliation;

pub use config::RepaymentConfig;
pub use error::RepaymentError;
pub use types::*;

/// Standard result type for all repayment operations
pub type RepaymentResult<T> = Result<T, RepaymentError>;
