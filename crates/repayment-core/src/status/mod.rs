pub mod loan;
pub mod paid_off;

pub use loan::{recompute_loan_status, refresh_loan_status, LoanStatusChange};
pub use paid_off::{
    evaluate_paid_status, refresh_account_payment, refresh_payment_status, resolve_paid_status,
    PaidStatusInput, PaidStatusOutput,
};
