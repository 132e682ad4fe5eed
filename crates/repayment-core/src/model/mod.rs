pub mod account;
pub mod loan;
pub mod payment;
pub mod transaction;

pub use account::{Account, AccountPayment, AccountPaymentStatus};
pub use loan::{Loan, LoanStatus};
pub use payment::{Payment, PaymentStatus};
pub use transaction::{PaybackTransaction, RepaymentSource};
