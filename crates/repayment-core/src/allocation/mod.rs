pub mod waiver;
pub mod waterfall;

pub use waiver::{PaymentWaiver, WaiverRequest};
pub use waterfall::{allocate, allocate_payment, AllocationInput, AllocationOutput, PaymentAllocation};
