use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Periodic rates expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Rates quoted the way borrowers type them (5.5 = 5.5%).
pub type Percent = Decimal;

/// The five loan parameters every calculation starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanInputs {
    /// Original loan amount
    pub principal: Money,
    /// Nominal annual rate in percent
    pub annual_rate_percent: Percent,
    /// Loan length in years
    pub term_years: u32,
    /// Additional payment applied each month once active
    #[serde(default)]
    pub extra_contribution: Money,
    /// Whole years before the extra contribution starts
    #[serde(default)]
    pub start_after_years: u32,
}

impl LoanInputs {
    /// Number of scheduled monthly payments.
    pub fn term_months(&self) -> u32 {
        self.term_years.saturating_mul(12)
    }

    /// Month index (0-based) at which extra contributions begin.
    pub fn extra_start_month(&self) -> u32 {
        self.start_after_years.saturating_mul(12)
    }
}

/// Sensitivity variable specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
