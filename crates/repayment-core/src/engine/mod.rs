pub mod payment_flow;
pub mod simulation;

pub use payment_flow::{AccountPaymentOutcome, PaymentProcessor, RepaymentOutcome};
pub use simulation::{simulate, SimulationInput, SimulationOutput, TransactionResult};
