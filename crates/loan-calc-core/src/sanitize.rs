//! Free-text input cleaning.
//!
//! Calculator fields arrive as typed text (`"$300,000"`, `"5.5%"`,
//! `"30 years"`). Everything except digits, `.` and `-` is stripped and the
//! longest leading number is taken; text with no number reads as zero. A
//! number beyond the `Decimal` range is rejected rather than read as zero.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanCalcError;
use crate::types::LoanInputs;
use crate::LoanCalcResult;

/// Loan fields exactly as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLoanInputs {
    pub principal: String,
    pub annual_rate: String,
    pub term: String,
    #[serde(default)]
    pub extra_contribution: String,
    #[serde(default)]
    pub start_after: String,
}

/// Parse the numeric value out of free text. Returns zero when no number
/// can be read.
pub fn clean_input(text: &str, field: &str) -> LoanCalcResult<Decimal> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let mut chars = kept.chars().peekable();
    let negative = chars.next_if_eq(&'-').is_some();

    let mut integer = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        integer.push(c);
    }
    let mut fraction = String::new();
    if chars.next_if_eq(&'.').is_some() {
        while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
            fraction.push(c);
        }
    }

    if integer.is_empty() && fraction.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let mut literal = String::with_capacity(integer.len() + fraction.len() + 3);
    if negative {
        literal.push('-');
    }
    if integer.is_empty() {
        literal.push('0');
    } else {
        literal.push_str(&integer);
    }
    if !fraction.is_empty() {
        literal.push('.');
        literal.push_str(&fraction);
    }

    Decimal::from_str(&literal).map_err(|_| LoanCalcError::InvalidInput {
        field: field.into(),
        reason: format!("'{text}' is outside the supported numeric range"),
    })
}

/// Parse a whole, non-negative count (years) out of free text.
pub fn clean_whole_number(text: &str, field: &str) -> LoanCalcResult<u32> {
    let value = clean_input(text, field)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LoanCalcError::InvalidInput {
            field: field.into(),
            reason: format!("'{text}' must not be negative"),
        });
    }
    if !value.fract().is_zero() {
        return Err(LoanCalcError::InvalidInput {
            field: field.into(),
            reason: format!("'{text}' must be a whole number of years"),
        });
    }
    value.to_u32().ok_or_else(|| LoanCalcError::InvalidInput {
        field: field.into(),
        reason: format!("'{text}' is too large"),
    })
}

/// Clean every field of `raw` into [`LoanInputs`].
pub fn parse_loan_inputs(raw: &RawLoanInputs) -> LoanCalcResult<LoanInputs> {
    Ok(LoanInputs {
        principal: clean_input(&raw.principal, "principal")?,
        annual_rate_percent: clean_input(&raw.annual_rate, "annual_rate_percent")?,
        term_years: clean_whole_number(&raw.term, "term_years")?,
        extra_contribution: clean_input(&raw.extra_contribution, "extra_contribution")?,
        start_after_years: clean_whole_number(&raw.start_after, "start_after_years")?,
    })
}
