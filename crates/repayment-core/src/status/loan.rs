use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Loan, LoanStatus, Payment};
use crate::types::LoanId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanStatusChange {
    pub loan_id: LoanId,
    pub from: LoanStatus,
    pub to: LoanStatus,
}

/// Status a loan should carry on `as_of` given its instalments.
pub fn recompute_loan_status(loan: &Loan, payments: &[Payment], as_of: NaiveDate) -> LoanStatus {
    let own: Vec<&Payment> = payments.iter().filter(|p| p.loan_id == loan.id).collect();
    if own.is_empty() {
        return loan.status;
    }
    if own.iter().all(|p| p.is_settled()) {
        return LoanStatus::PaidOff;
    }
    if loan.status == LoanStatus::Renegotiated {
        return LoanStatus::Renegotiated;
    }

    let worst_dpd = own
        .iter()
        .filter(|p| !p.is_settled())
        .map(|p| (as_of - p.due_date).num_days())
        .max()
        .unwrap_or(0);
    LoanStatus::from_days_past_due(worst_dpd)
}

/// Apply the recomputed status, returning the change if there was one.
pub fn refresh_loan_status(
    loan: &mut Loan,
    payments: &[Payment],
    as_of: NaiveDate,
) -> Option<LoanStatusChange> {
    let next = recompute_loan_status(loan, payments, as_of);
    if next == loan.status || !loan.status.can_transition_to(next) {
        return None;
    }
    let change = LoanStatusChange {
        loan_id: loan.id,
        from: loan.status,
        to: next,
    };
    loan.status = next;
    Some(change)
}
