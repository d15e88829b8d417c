use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Amortisation
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_loan(input_json: String) -> NapiResult<String> {
    let input: loan_calc_core::amortization::analysis::LoanAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_calc_core::amortization::analysis::analyze_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn balance_trajectory(input_json: String) -> NapiResult<String> {
    let input: loan_calc_core::types::LoanInputs =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let trajectory =
        loan_calc_core::amortization::engine::balance_trajectory(&input).map_err(to_napi_error)?;
    let datasets = loan_calc_core::presentation::chart_datasets(&trajectory);
    serde_json::to_string(&datasets).map_err(to_napi_error)
}

#[napi]
pub fn savings_sensitivity(input_json: String) -> NapiResult<String> {
    let input: loan_calc_core::amortization::sensitivity::SensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = loan_calc_core::amortization::sensitivity::savings_sensitivity(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Form input
// ---------------------------------------------------------------------------

/// Clean the five form fields as typed and return `LoanInputs` JSON.
#[napi]
pub fn clean_loan_inputs(raw_json: String) -> NapiResult<String> {
    let raw: loan_calc_core::sanitize::RawLoanInputs =
        serde_json::from_str(&raw_json).map_err(to_napi_error)?;
    let inputs = loan_calc_core::sanitize::parse_loan_inputs(&raw).map_err(to_napi_error)?;
    serde_json::to_string(&inputs).map_err(to_napi_error)
}
