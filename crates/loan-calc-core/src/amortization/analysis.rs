use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::engine::{self, BalanceTrajectory};
use crate::amortization::simulation::{checked_add, checked_mul, checked_sub};
use crate::error::LoanCalcError;
use crate::presentation::{self, DisplaySummary};
use crate::types::*;
use crate::LoanCalcResult;

/// Loan parameters plus an optional first-payment date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisInput {
    #[serde(flatten)]
    pub loan: LoanInputs,
    /// When set, payoff months are converted to calendar dates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Everything the calculator shows for one set of inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysis {
    pub monthly_repayment: Money,
    /// Minimum repayment plus the extra contribution
    pub increased_repayment: Money,
    pub interest_saved: Money,
    pub months_saved: i64,
    pub total_repayment_without_extra: Money,
    pub total_repayment_with_extra: Money,
    pub total_interest_without_extra: Money,
    pub total_interest_with_extra: Money,
    pub payoff_months_without_extra: u32,
    pub payoff_months_with_extra: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date_without_extra: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payoff_date_with_extra: Option<NaiveDate>,
    pub trajectory: BalanceTrajectory,
    pub display: DisplaySummary,
}

/// Run every engine calculation for `input` and collect warnings for
/// degenerate parameters.
pub fn analyze_loan(
    input: &LoanAnalysisInput,
) -> LoanCalcResult<ComputationOutput<LoanAnalysis>> {
    let start = Instant::now();
    let loan = &input.loan;

    validate_input(loan)?;
    let mut warnings = degenerate_input_warnings(loan);

    let monthly_repayment =
        engine::monthly_repayment(loan.principal, loan.annual_rate_percent, loan.term_years)?;

    if engine::monthly_interest_rate(loan.annual_rate_percent).is_zero() {
        warnings.push(
            "Annual rate is zero; monthly repayment uses the zero-rate limit principal / months"
                .into(),
        );
    }
    let first_month_interest = checked_mul(
        loan.principal,
        engine::monthly_interest_rate(loan.annual_rate_percent),
        "first-month interest",
    )?;
    if loan.principal > Decimal::ZERO && monthly_repayment <= first_month_interest {
        warnings.push(format!(
            "Monthly repayment {monthly_repayment} does not exceed first-month interest \
             {first_month_interest}; the loan does not amortise"
        ));
    }

    let total_without = engine::total_repayment_without_extra(monthly_repayment, loan.term_years)?;
    let total_with = engine::total_repayment_with_extra(
        loan.principal,
        loan.annual_rate_percent,
        loan.term_years,
        loan.extra_contribution,
        loan.start_after_years,
        monthly_repayment,
    )?;
    let interest_saved = engine::interest_saved(
        loan.principal,
        loan.annual_rate_percent,
        loan.term_years,
        loan.extra_contribution,
        loan.start_after_years,
    )?;
    let payoff = engine::payoff_months(
        loan.principal,
        loan.annual_rate_percent,
        loan.term_years,
        loan.extra_contribution,
        loan.start_after_years,
        monthly_repayment,
    )?;
    let months_saved = payoff.months_saved();
    if months_saved < 0 {
        warnings.push(format!(
            "Extra contribution lengthens the loan by {} months",
            -months_saved
        ));
    }

    let trajectory = engine::balance_trajectory(loan)?;

    let (payoff_date_without_extra, payoff_date_with_extra) = match input.start_date {
        Some(date) => (
            Some(add_months(date, payoff.without_extra)?),
            Some(add_months(date, payoff.with_extra)?),
        ),
        None => (None, None),
    };

    let increased_repayment = checked_add(
        monthly_repayment,
        loan.extra_contribution,
        "increased repayment",
    )?;
    let total_interest_without_extra =
        checked_sub(total_without, loan.principal, "interest without extra")?;
    let total_interest_with_extra = checked_sub(total_with, loan.principal, "interest with extra")?;

    let display = presentation::display_summary(
        monthly_repayment,
        increased_repayment,
        interest_saved,
        months_saved,
    );

    let output = LoanAnalysis {
        monthly_repayment,
        increased_repayment,
        interest_saved,
        months_saved,
        total_repayment_without_extra: total_without,
        total_repayment_with_extra: total_with,
        total_interest_without_extra,
        total_interest_with_extra,
        payoff_months_without_extra: payoff.without_extra,
        payoff_months_with_extra: payoff.with_extra,
        payoff_date_without_extra,
        payoff_date_with_extra,
        trajectory,
        display,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-Payment Amortisation with Extra Contributions",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_input(loan: &LoanInputs) -> LoanCalcResult<()> {
    if loan.term_years == 0 {
        return Err(LoanCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "Loan term must be at least 1 year".into(),
        });
    }
    Ok(())
}

fn degenerate_input_warnings(loan: &LoanInputs) -> Vec<String> {
    let mut warnings = Vec::new();
    if loan.principal < Decimal::ZERO {
        warnings.push(format!("Principal {} is negative", loan.principal));
    }
    if loan.annual_rate_percent < Decimal::ZERO {
        warnings.push(format!(
            "Annual rate {}% is negative",
            loan.annual_rate_percent
        ));
    }
    if loan.extra_contribution < Decimal::ZERO {
        warnings.push(format!(
            "Extra contribution {} is negative",
            loan.extra_contribution
        ));
    }
    if loan.start_after_years > loan.term_years {
        warnings.push(format!(
            "Extra contribution starts after year {} but the term is {} years; it is never applied",
            loan.start_after_years, loan.term_years
        ));
    }
    warnings
}

fn add_months(date: NaiveDate, months: u32) -> LoanCalcResult<NaiveDate> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        LoanCalcError::DateError(format!("{date} plus {months} months is out of range"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn standard_input() -> LoanAnalysisInput {
        LoanAnalysisInput {
            loan: LoanInputs {
                principal: dec!(300000),
                annual_rate_percent: dec!(5),
                term_years: 30,
                extra_contribution: dec!(200),
                start_after_years: 0,
            },
            start_date: None,
        }
    }

    #[test]
    fn test_analysis_headline_figures() {
        let out = analyze_loan(&standard_input()).unwrap();
        let a = &out.result;
        assert!(a.interest_saved > Decimal::ZERO);
        assert!(a.months_saved > 0);
        assert_eq!(a.increased_repayment, a.monthly_repayment + dec!(200));
        assert_eq!(a.payoff_months_without_extra, 360);
        assert_eq!(
            a.months_saved,
            i64::from(a.payoff_months_without_extra) - i64::from(a.payoff_months_with_extra)
        );
        assert_eq!(
            a.interest_saved,
            a.total_interest_without_extra - a.total_interest_with_extra
        );
        assert!(out.warnings.is_empty());
        assert_eq!(a.display.minimum_repayments, "$1,610.46");
    }

    #[test]
    fn test_payoff_dates_from_start_date() {
        let mut input = standard_input();
        input.start_date = NaiveDate::from_ymd_opt(2024, 1, 15);
        let out = analyze_loan(&input).unwrap();
        assert_eq!(
            out.result.payoff_date_without_extra,
            NaiveDate::from_ymd_opt(2054, 1, 15)
        );
        assert!(out.result.payoff_date_with_extra < out.result.payoff_date_without_extra);
    }

    #[test]
    fn test_zero_term_rejected() {
        let mut input = standard_input();
        input.loan.term_years = 0;
        assert!(analyze_loan(&input).is_err());
    }

    #[test]
    fn test_start_after_term_warns() {
        let mut input = standard_input();
        input.loan.start_after_years = 40;
        let out = analyze_loan(&input).unwrap();
        assert_eq!(out.result.months_saved, 0);
        assert!(out.warnings.iter().any(|w| w.contains("never applied")));
    }

    #[test]
    fn test_zero_rate_warns_and_uses_limit() {
        let mut input = standard_input();
        input.loan.principal = dec!(100000);
        input.loan.annual_rate_percent = Decimal::ZERO;
        input.loan.term_years = 10;
        input.loan.extra_contribution = Decimal::ZERO;
        let out = analyze_loan(&input).unwrap();
        assert_eq!(out.result.monthly_repayment, dec!(100000) / dec!(120));
        assert!(out.warnings.iter().any(|w| w.contains("zero-rate limit")));
    }

    #[test]
    fn test_unapplied_huge_extra_is_overflow_error() {
        let mut input = standard_input();
        input.loan.extra_contribution = Decimal::MAX;
        input.loan.start_after_years = 40;
        let err = analyze_loan(&input).unwrap_err();
        assert!(matches!(err, LoanCalcError::Overflow { .. }));
    }

    #[test]
    fn test_huge_principal_is_overflow_error() {
        let mut input = standard_input();
        input.loan.principal = Decimal::MAX;
        input.loan.annual_rate_percent = dec!(1200);
        assert!(analyze_loan(&input).is_err());
    }

    #[test]
    fn test_input_round_trips_through_json() {
        let json = r#"{
            "principal": "300000",
            "annual_rate_percent": "5",
            "term_years": 30,
            "extra_contribution": "200",
            "start_after_years": 0,
            "start_date": "2024-01-15"
        }"#;
        let input: LoanAnalysisInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.loan.term_years, 30);
        assert_eq!(input.start_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }
}
