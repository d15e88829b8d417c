use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::engine;
use crate::amortization::simulation::checked_add;
use crate::error::LoanCalcError;
use crate::types::*;
use crate::LoanCalcResult;

/// Loan input that a sensitivity run may sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepField {
    ExtraContribution,
    AnnualRatePercent,
    StartAfterYears,
}

impl SweepField {
    pub fn from_name(name: &str) -> LoanCalcResult<Self> {
        match name {
            "extra_contribution" => Ok(SweepField::ExtraContribution),
            "annual_rate_percent" => Ok(SweepField::AnnualRatePercent),
            "start_after_years" => Ok(SweepField::StartAfterYears),
            other => Err(LoanCalcError::InvalidInput {
                field: "variable.name".into(),
                reason: format!(
                    "'{other}' cannot be swept; use extra_contribution, \
                     annual_rate_percent or start_after_years"
                ),
            }),
        }
    }

    fn apply(self, base: &LoanInputs, value: Decimal) -> LoanCalcResult<LoanInputs> {
        let mut loan = base.clone();
        match self {
            SweepField::ExtraContribution => loan.extra_contribution = value,
            SweepField::AnnualRatePercent => loan.annual_rate_percent = value,
            SweepField::StartAfterYears => {
                loan.start_after_years = whole_years(value)?;
            }
        }
        Ok(loan)
    }
}

/// Base loan plus the variable to sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub base: LoanInputs,
    pub variable: SensitivityVariable,
}

/// Outcome for one swept value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub value: Decimal,
    pub monthly_repayment: Money,
    /// Minimum repayment plus extra contribution
    pub monthly_outlay: Money,
    pub interest_saved: Money,
    pub months_saved: i64,
}

/// Sweep output: one row per value, in ascending order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_name: String,
    pub rows: Vec<SensitivityRow>,
}

/// Sweep one loan input from `min` to `max` and report the savings
/// produced at each value.
pub fn savings_sensitivity(
    input: &SensitivityInput,
) -> LoanCalcResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.base.term_years == 0 {
        return Err(LoanCalcError::InvalidInput {
            field: "base.term_years".into(),
            reason: "Loan term must be at least 1 year".into(),
        });
    }

    let field = SweepField::from_name(&input.variable.name)?;
    let values = generate_sweep_values(&input.variable)?;

    let mut rows = Vec::with_capacity(values.len());
    for value in values {
        let loan = field.apply(&input.base, value)?;
        let summary = engine::repayment_summary(&loan)?;
        if field == SweepField::StartAfterYears && loan.start_after_years > loan.term_years {
            warnings.push(format!(
                "start_after_years = {} exceeds the {}-year term; no extra contribution applied",
                loan.start_after_years, loan.term_years
            ));
        }
        rows.push(SensitivityRow {
            value,
            monthly_repayment: summary.monthly_repayment,
            monthly_outlay: checked_add(
                summary.monthly_repayment,
                loan.extra_contribution,
                "monthly outlay",
            )?,
            interest_saved: summary.interest_saved,
            months_saved: summary.months_saved,
        });
    }

    let output = SensitivityOutput {
        variable_name: input.variable.name.clone(),
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Extra-Contribution Savings Sensitivity",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> LoanCalcResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(LoanCalcError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(LoanCalcError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        current += var.step;
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

fn whole_years(value: Decimal) -> LoanCalcResult<u32> {
    if !value.fract().is_zero() {
        return Err(LoanCalcError::InvalidInput {
            field: "variable:start_after_years".into(),
            reason: format!("{value} is not a whole number of years"),
        });
    }
    value.to_u32().ok_or_else(|| LoanCalcError::InvalidInput {
        field: "variable:start_after_years".into(),
        reason: format!("{value} is not a valid year count"),
    })
}
