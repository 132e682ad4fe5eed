use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[napi]
pub fn allocate_payment(input_json: String) -> NapiResult<String> {
    let input: repayment_core::allocation::AllocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = repayment_core::allocation::allocate_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Component order used by every waterfall pass, e.g. `["late_fee", "interest", "principal"]`.
#[napi]
pub fn allocation_order() -> NapiResult<String> {
    serde_json::to_string(&repayment_core::ALLOCATION_ORDER).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_paid_status(input_json: String) -> NapiResult<String> {
    let input: repayment_core::status::PaidStatusInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = repayment_core::status::evaluate_paid_status(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Payment flow
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_repayments(input_json: String) -> NapiResult<String> {
    let input: repayment_core::engine::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = repayment_core::engine::simulate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_config() -> NapiResult<String> {
    serde_json::to_string(&repayment_core::RepaymentConfig::default()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[napi]
pub fn reconcile_loan_statuses(input_json: String) -> NapiResult<String> {
    let input: repayment_core::reconciliation::ReconciliationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = repayment_core::reconciliation::reconcile(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
