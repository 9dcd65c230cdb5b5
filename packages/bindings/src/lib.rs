use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let input: loan_sim_core::amortization::schedule::LoanInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_sim_core::amortization::schedule::compute_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    let input: loan_sim_core::amortization::comparison::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_sim_core::amortization::comparison::compare_scenarios(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn rural_schedule(input_json: String) -> NapiResult<String> {
    let input: loan_sim_core::rural::grace_period::RuralInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_sim_core::rural::grace_period::compute_rural_schedule(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Tax, rates and checks
// ---------------------------------------------------------------------------

#[napi]
pub fn transaction_tax(input_json: String) -> NapiResult<String> {
    let input: loan_sim_core::tax::TaxInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_sim_core::tax::compute_transaction_tax(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn solve_rate(input_json: String) -> NapiResult<String> {
    let input: loan_sim_core::rate_solver::bisection::RateSolverInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_sim_core::rate_solver::bisection::solve_rate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn check_discount(input_json: String) -> NapiResult<String> {
    let input: loan_sim_core::check_discount::discount::CheckDiscountInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_sim_core::check_discount::discount::compute_discount(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
