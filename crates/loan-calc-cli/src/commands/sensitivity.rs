use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use loan_calc_core::amortization::sensitivity::{self, SensitivityInput};
use loan_calc_core::types::SensitivityVariable;

use super::loan::{load_loan, LoanArgs};

/// Arguments for savings sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Variable to sweep in format name:min:max:step
    /// (e.g. "extra_contribution:0:500:100"); name is one of
    /// extra_contribution, annual_rate_percent, start_after_years
    #[arg(long)]
    pub var: String,
}

fn parse_sens_var(arg: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = arg.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            arg
        )
        .into());
    }
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        min: parts[1].parse::<Decimal>()?,
        max: parts[2].parse::<Decimal>()?,
        step: parts[3].parse::<Decimal>()?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let variable = parse_sens_var(&args.var)?;
    let base = load_loan(&args.loan)?.loan;

    let output = sensitivity::savings_sensitivity(&SensitivityInput { base, variable })?;

    Ok(json!({
        "variable_name": output.result.variable_name,
        "results": output.result.rows,
        "warnings": output.warnings,
        "methodology": output.methodology,
    }))
}
