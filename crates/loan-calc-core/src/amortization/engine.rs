//! Amortisation engine: monthly rate, level payment, total repayment,
//! interest saved, time saved and yearly balance trajectories.
//!
//! Every function takes explicit scalar inputs; the [`LoanInputs`] helpers at
//! the bottom are thin conveniences over them. All math in
//! `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::simulation::{
    checked_add, checked_mul, checked_sub, Granularity, PaymentPolicy, Simulation,
};
use crate::error::LoanCalcError;
use crate::types::{LoanInputs, Money, Percent, Rate};
use crate::LoanCalcResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MONTHS_PER_YEAR: u32 = 12;
const MONTHS_PER_YEAR_DEC: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);
/// Year-end balances below half a cent are reported as paid off.
const PAID_OFF_BELOW: Money = dec!(0.005);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Headline figures shown to the borrower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentSummary {
    pub monthly_repayment: Money,
    pub interest_saved: Money,
    /// Negative only for degenerate inputs
    pub months_saved: i64,
}

/// Month counts until payoff, as measured by the time-saved recurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffMonths {
    pub without_extra: u32,
    pub with_extra: u32,
}

impl PayoffMonths {
    pub fn months_saved(&self) -> i64 {
        i64::from(self.without_extra) - i64::from(self.with_extra)
    }
}

/// Outstanding balance at the end of a year (year 0 is the opening balance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePoint {
    pub year: u32,
    pub balance: Money,
}

/// Two balance series on a shared year axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTrajectory {
    pub with_extra: Vec<BalancePoint>,
    pub without_extra: Vec<BalancePoint>,
}

// ---------------------------------------------------------------------------
// Rates and payments
// ---------------------------------------------------------------------------

/// Convert an annual percentage rate into a monthly decimal rate.
pub fn monthly_interest_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / MONTHS_PER_YEAR_DEC / PERCENT
}

/// Level monthly payment that amortises `principal` over `term_years`.
///
/// `payment = P * r / (1 - (1 + r)^-n)`. When the rate is zero, or so small
/// that `(1 + r)^-n` rounds to one, the payment is the zero-rate limit
/// `P / n`. At rates high enough that `(1 + r)^n` exceeds `Decimal::MAX` the
/// discount factor is zero and the payment is `P * r`. A zero-month term has
/// no payment and is a division by zero.
pub fn monthly_repayment(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
) -> LoanCalcResult<Money> {
    let n = term_months(term_years)?;
    if n == 0 {
        return Err(LoanCalcError::DivisionByZero {
            context: "monthly repayment over a zero-month term".into(),
        });
    }

    let rate = monthly_interest_rate(annual_rate_percent);
    if rate.is_zero() {
        return Ok(principal / Decimal::from(n));
    }

    let discount = discount_factor(rate, n)?;
    let denominator = checked_sub(Decimal::ONE, discount, "annuity factor")?;
    if denominator.is_zero() {
        return Ok(principal / Decimal::from(n));
    }

    let numerator = checked_mul(principal, rate, "monthly repayment")?;
    numerator
        .checked_div(denominator)
        .ok_or_else(|| LoanCalcError::Overflow {
            context: "monthly repayment".into(),
        })
}

/// Total actually repaid when `extra_contribution` is paid on top of
/// `monthly_repayment` from year `start_after_years`.
///
/// Interest accrues first, then the extra and the minimum are each capped at
/// the remaining balance, so the total never includes overshoot.
pub fn total_repayment_with_extra(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
    extra_contribution: Money,
    start_after_years: u32,
    monthly_repayment: Money,
) -> LoanCalcResult<Money> {
    let sim = Simulation {
        opening_balance: principal,
        monthly_rate: monthly_interest_rate(annual_rate_percent),
        minimum_payment: monthly_repayment,
        extra_contribution,
        extra_start_month: start_after_years.saturating_mul(MONTHS_PER_YEAR),
        horizon_months: term_months(term_years)?,
    };
    let report = sim.run(PaymentPolicy::CappedInstalments, Granularity::TotalRepaid)?;
    Ok(report.total_repaid)
}

/// Full-term cost of minimum payments only: `payment * n`.
pub fn total_repayment_without_extra(
    monthly_repayment: Money,
    term_years: u32,
) -> LoanCalcResult<Money> {
    let n = term_months(term_years)?;
    checked_mul(monthly_repayment, Decimal::from(n), "total repayment")
}

/// Interest avoided by the extra contribution, relative to paying the
/// minimum for the full term.
pub fn interest_saved(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
    extra_contribution: Money,
    start_after_years: u32,
) -> LoanCalcResult<Money> {
    let payment = monthly_repayment(principal, annual_rate_percent, term_years)?;
    let without_extra = total_repayment_without_extra(payment, term_years)?;
    let with_extra = total_repayment_with_extra(
        principal,
        annual_rate_percent,
        term_years,
        extra_contribution,
        start_after_years,
        payment,
    )?;
    let interest_without = checked_sub(without_extra, principal, "interest without extra")?;
    let interest_with = checked_sub(with_extra, principal, "interest with extra")?;
    checked_sub(interest_without, interest_with, "interest saved")
}

/// Months to payoff with and without the extra contribution.
///
/// The baseline runs `balance * (1 + r) - payment` unclamped; the scenario
/// deducts the extra before interest and clamps at zero. Both stop at the
/// term.
pub fn payoff_months(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
    extra_contribution: Money,
    start_after_years: u32,
    monthly_repayment: Money,
) -> LoanCalcResult<PayoffMonths> {
    let sim = Simulation {
        opening_balance: principal,
        monthly_rate: monthly_interest_rate(annual_rate_percent),
        minimum_payment: monthly_repayment,
        extra_contribution,
        extra_start_month: start_after_years.saturating_mul(MONTHS_PER_YEAR),
        horizon_months: term_months(term_years)?,
    };
    let baseline = sim.run(PaymentPolicy::MinimumOnly, Granularity::MonthCount)?;
    let scenario = sim.run(PaymentPolicy::ExtraBeforeInterest, Granularity::MonthCount)?;
    Ok(PayoffMonths {
        without_extra: baseline.months_elapsed,
        with_extra: scenario.months_elapsed,
    })
}

/// Months by which the extra contribution shortens the loan.
pub fn time_saved(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
    extra_contribution: Money,
    start_after_years: u32,
    monthly_repayment: Money,
) -> LoanCalcResult<i64> {
    let months = payoff_months(
        principal,
        annual_rate_percent,
        term_years,
        extra_contribution,
        start_after_years,
        monthly_repayment,
    )?;
    Ok(months.months_saved())
}

/// Year-end balances with and without the extra contribution.
///
/// Both series start at `(0, principal)` and gain one point per simulated
/// year for years `0..=term_years`, stopping after the first year in which
/// both balances are zero. Balances are clamped at zero every month, and a
/// year-end balance below half a cent counts as zero.
pub fn yearly_balance_trajectory(
    principal: Money,
    annual_rate_percent: Percent,
    term_years: u32,
    extra_contribution: Money,
    start_after_years: u32,
) -> LoanCalcResult<BalanceTrajectory> {
    let payment = monthly_repayment(principal, annual_rate_percent, term_years)?;
    let horizon_years = term_years
        .checked_add(1)
        .ok_or_else(|| LoanCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "Term is too long to simulate".into(),
        })?;

    let with_extra_sim = Simulation {
        opening_balance: principal,
        monthly_rate: monthly_interest_rate(annual_rate_percent),
        minimum_payment: payment,
        extra_contribution,
        extra_start_month: start_after_years.saturating_mul(MONTHS_PER_YEAR),
        horizon_months: term_months(horizon_years)?,
    };
    let without_extra_sim = Simulation {
        extra_contribution: Decimal::ZERO,
        ..with_extra_sim
    };

    let with_extra = with_extra_sim.run(PaymentPolicy::CombinedClamped, Granularity::YearEnd)?;
    let without_extra =
        without_extra_sim.run(PaymentPolicy::CombinedClamped, Granularity::YearEnd)?;

    let mut trajectory = BalanceTrajectory {
        with_extra: vec![BalancePoint {
            year: 0,
            balance: principal,
        }],
        without_extra: vec![BalancePoint {
            year: 0,
            balance: principal,
        }],
    };

    let year_ends = with_extra
        .year_end_balances
        .iter()
        .zip(without_extra.year_end_balances.iter());
    for (year, (with_bal, without_bal)) in (1u32..).zip(year_ends) {
        let with_bal = settle(*with_bal);
        let without_bal = settle(*without_bal);
        trajectory.with_extra.push(BalancePoint {
            year,
            balance: with_bal,
        });
        trajectory.without_extra.push(BalancePoint {
            year,
            balance: without_bal,
        });
        if with_bal.is_zero() && without_bal.is_zero() {
            break;
        }
    }

    Ok(trajectory)
}

// ---------------------------------------------------------------------------
// LoanInputs conveniences
// ---------------------------------------------------------------------------

/// Monthly repayment, interest saved and months saved for `inputs`.
pub fn repayment_summary(inputs: &LoanInputs) -> LoanCalcResult<RepaymentSummary> {
    let payment = monthly_repayment(
        inputs.principal,
        inputs.annual_rate_percent,
        inputs.term_years,
    )?;
    let saved = interest_saved(
        inputs.principal,
        inputs.annual_rate_percent,
        inputs.term_years,
        inputs.extra_contribution,
        inputs.start_after_years,
    )?;
    let months = time_saved(
        inputs.principal,
        inputs.annual_rate_percent,
        inputs.term_years,
        inputs.extra_contribution,
        inputs.start_after_years,
        payment,
    )?;
    Ok(RepaymentSummary {
        monthly_repayment: payment,
        interest_saved: saved,
        months_saved: months,
    })
}

/// Balance trajectory for `inputs`.
pub fn balance_trajectory(inputs: &LoanInputs) -> LoanCalcResult<BalanceTrajectory> {
    yearly_balance_trajectory(
        inputs.principal,
        inputs.annual_rate_percent,
        inputs.term_years,
        inputs.extra_contribution,
        inputs.start_after_years,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn term_months(term_years: u32) -> LoanCalcResult<u32> {
    term_years
        .checked_mul(MONTHS_PER_YEAR)
        .ok_or_else(|| LoanCalcError::InvalidInput {
            field: "term_years".into(),
            reason: "Term in months exceeds u32".into(),
        })
}

fn settle(balance: Money) -> Money {
    if balance < PAID_OFF_BELOW {
        Decimal::ZERO
    } else {
        balance
    }
}

/// `(1 + r)^-n`. Growth beyond `Decimal::MAX` has a reciprocal below the
/// smallest representable step, so it discounts to zero.
fn discount_factor(rate: Rate, n: u32) -> LoanCalcResult<Decimal> {
    let base = checked_add(Decimal::ONE, rate, "monthly growth factor")?;
    let growth = match iterative_pow(base, n) {
        Ok(growth) => growth,
        Err(LoanCalcError::Overflow { .. }) => return Ok(Decimal::ZERO),
        Err(e) => return Err(e),
    };
    if growth.is_zero() {
        return Err(LoanCalcError::DivisionByZero {
            context: "monthly repayment discount factor".into(),
        });
    }
    Decimal::ONE
        .checked_div(growth)
        .ok_or_else(|| LoanCalcError::Overflow {
            context: "monthly repayment discount factor".into(),
        })
}

/// base^n by repeated multiplication (no powd).
fn iterative_pow(base: Decimal, n: u32) -> LoanCalcResult<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = checked_mul(result, base, "compound growth factor")?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.01);

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    #[test]
    fn test_monthly_interest_rate() {
        assert_eq!(monthly_interest_rate(dec!(12)), dec!(0.01));
        assert_eq!(monthly_interest_rate(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(monthly_interest_rate(dec!(-6)), dec!(-0.005));
    }

    #[test]
    fn test_monthly_repayment_30y_mortgage() {
        let pmt = monthly_repayment(dec!(300000), dec!(5), 30).unwrap();
        assert_close(pmt, dec!(1610.46), TOL, "30y 5% payment");
    }

    #[test]
    fn test_monthly_repayment_zero_rate_limit() {
        let pmt = monthly_repayment(dec!(100000), Decimal::ZERO, 10).unwrap();
        assert_eq!(pmt, dec!(100000) / dec!(120));
        assert_close(pmt, dec!(833.33), TOL, "zero-rate payment");
    }

    #[test]
    fn test_monthly_repayment_near_zero_rate_matches_limit() {
        let pmt = monthly_repayment(dec!(120000), dec!(0.0000001), 10).unwrap();
        assert_close(pmt, dec!(1000), TOL, "near-zero payment");
    }

    #[test]
    fn test_monthly_repayment_zero_term_is_error() {
        let err = monthly_repayment(dec!(1000), dec!(5), 0).unwrap_err();
        assert!(matches!(err, LoanCalcError::DivisionByZero { .. }));
    }

    #[test]
    fn test_monthly_repayment_negative_rate_is_finite() {
        let pmt = monthly_repayment(dec!(12000), dec!(-1), 1).unwrap();
        assert!(pmt > Decimal::ZERO);
        assert!(pmt < dec!(1000));
    }

    #[test]
    fn test_total_repayment_zero_extra_matches_schedule() {
        let pmt = monthly_repayment(dec!(300000), dec!(5), 30).unwrap();
        let total =
            total_repayment_with_extra(dec!(300000), dec!(5), 30, Decimal::ZERO, 0, pmt).unwrap();
        let scheduled = total_repayment_without_extra(pmt, 30).unwrap();
        assert_close(total, scheduled, TOL, "zero-extra total");
    }

    #[test]
    fn test_total_repayment_caps_final_payment() {
        // 1000 at 0%: minimum 100/month plus 350 extra pays off in month 3
        // with a final 100 of extra and nothing left for the minimum.
        let total =
            total_repayment_with_extra(dec!(1000), Decimal::ZERO, 1, dec!(350), 0, dec!(100))
                .unwrap();
        assert_eq!(total, dec!(1000));
    }

    #[test]
    fn test_interest_saved_positive_with_extra() {
        let saved = interest_saved(dec!(300000), dec!(5), 30, dec!(200), 0).unwrap();
        assert!(saved > Decimal::ZERO);
    }

    #[test]
    fn test_interest_saved_zero_without_extra() {
        let saved = interest_saved(dec!(300000), dec!(5), 30, Decimal::ZERO, 0).unwrap();
        assert_close(saved, Decimal::ZERO, TOL, "no extra, no saving");
    }

    #[test]
    fn test_time_saved_with_extra() {
        let pmt = monthly_repayment(dec!(300000), dec!(5), 30).unwrap();
        let months = time_saved(dec!(300000), dec!(5), 30, dec!(200), 0, pmt).unwrap();
        assert!(months > 0);
    }

    #[test]
    fn test_time_saved_start_after_term_is_noop() {
        let pmt = monthly_repayment(dec!(100000), dec!(6), 10).unwrap();
        let months = time_saved(dec!(100000), dec!(6), 10, dec!(500), 15, pmt).unwrap();
        assert_eq!(months, 0);
    }

    #[test]
    fn test_payoff_months_bounded_by_term() {
        let months = payoff_months(dec!(100000), dec!(6), 10, Decimal::ZERO, 0, dec!(1)).unwrap();
        assert_eq!(months.without_extra, 120);
        assert_eq!(months.with_extra, 120);
    }

    #[test]
    fn test_trajectory_starts_at_principal_and_reaches_zero() {
        let traj = yearly_balance_trajectory(dec!(50000), dec!(4), 5, dec!(100), 0).unwrap();
        assert_eq!(traj.with_extra[0].balance, dec!(50000));
        assert_eq!(traj.without_extra[0].balance, dec!(50000));
        assert_eq!(traj.with_extra.len(), traj.without_extra.len());
        assert!(traj.with_extra.last().unwrap().balance.is_zero());
        assert!(traj.without_extra.last().unwrap().balance.is_zero());
        assert_eq!(traj.without_extra.last().unwrap().year, 5);
    }

    #[test]
    fn test_trajectory_sub_cent_residual_is_paid_off() {
        let traj = yearly_balance_trajectory(dec!(300000), dec!(5), 30, dec!(200), 0).unwrap();
        assert_eq!(traj.with_extra.len(), 31);
        assert_eq!(traj.without_extra.len(), 31);
        assert_eq!(traj.without_extra[30].year, 30);
        assert_eq!(traj.without_extra[30].balance, Decimal::ZERO);
        assert!(traj.without_extra[29].balance > Decimal::ZERO);
    }

    #[test]
    fn test_monthly_repayment_high_rate_is_interest_only() {
        // 300% a year is 25% a month; (1.25)^360 is beyond Decimal::MAX
        let pmt = monthly_repayment(dec!(300000), dec!(300), 30).unwrap();
        assert_eq!(pmt, dec!(75000));

        let pmt = monthly_repayment(dec!(300000), dec!(100), 100).unwrap();
        assert_close(pmt, dec!(25000), TOL, "100% over 100 years");
    }

    #[test]
    fn test_monthly_repayment_rate_of_minus_one_per_month() {
        // -1200% a year makes 1 + r zero
        let err = monthly_repayment(dec!(1000), dec!(-1200), 1).unwrap_err();
        assert!(matches!(err, LoanCalcError::DivisionByZero { .. }));
    }

    #[test]
    fn test_trajectory_monotone_non_increasing() {
        let traj = yearly_balance_trajectory(dec!(250000), dec!(6.5), 25, dec!(300), 3).unwrap();
        for series in [&traj.with_extra, &traj.without_extra] {
            for pair in series.windows(2) {
                assert!(pair[1].balance <= pair[0].balance);
                assert_eq!(pair[1].year, pair[0].year + 1);
            }
        }
    }

    #[test]
    fn test_trajectory_extra_only_after_start_year() {
        let traj = yearly_balance_trajectory(dec!(100000), dec!(5), 20, dec!(1000), 2).unwrap();
        assert_eq!(traj.with_extra[1].balance, traj.without_extra[1].balance);
        assert_eq!(traj.with_extra[2].balance, traj.without_extra[2].balance);
        assert!(traj.with_extra[3].balance < traj.without_extra[3].balance);
    }

    #[test]
    fn test_repayment_summary_from_inputs() {
        let inputs = LoanInputs {
            principal: dec!(300000),
            annual_rate_percent: dec!(5),
            term_years: 30,
            extra_contribution: dec!(200),
            start_after_years: 0,
        };
        let summary = repayment_summary(&inputs).unwrap();
        assert_close(summary.monthly_repayment, dec!(1610.46), TOL, "summary payment");
        assert!(summary.interest_saved > Decimal::ZERO);
        assert!(summary.months_saved > 0);
    }
}
