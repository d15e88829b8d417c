//! Forward month-by-month loan simulation.
//!
//! Every loop in the engine is a run of [`Simulation`] under one of four
//! payment policies. The policies are not interchangeable: each applies
//! interest, the minimum payment and the extra contribution in a different
//! order, with different capping, and so produces different balances for the
//! same loan. Callers pick the policy whose recurrence they need:
//!
//! | Caller | Policy | Granularity |
//! |---|---|---|
//! | `total_repayment_with_extra` | `CappedInstalments` | `TotalRepaid` |
//! | `time_saved` baseline | `MinimumOnly` | `MonthCount` |
//! | `time_saved` scenario | `ExtraBeforeInterest` | `MonthCount` |
//! | `yearly_balance_trajectory` | `CombinedClamped` | `YearEnd` |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanCalcError;
use crate::types::{Money, Rate};
use crate::LoanCalcResult;

// ---------------------------------------------------------------------------
// Policy and granularity
// ---------------------------------------------------------------------------

/// How a single month moves the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentPolicy {
    /// Interest accrues on a positive balance, then the extra contribution
    /// (when active and positive) and the minimum payment are applied in
    /// turn, each capped at the remaining balance.
    CappedInstalments,
    /// `balance * (1 + r) - minimum`. The balance may go negative.
    MinimumOnly,
    /// Extra contribution (when active) is deducted before interest, then
    /// `balance * (1 + r) - minimum`, clamped at zero.
    ExtraBeforeInterest,
    /// `balance * (1 + r) - (minimum + extra)`, extra only when active,
    /// clamped at zero.
    CombinedClamped,
}

impl PaymentPolicy {
    /// Whether the paid-off test runs before each step (`while balance > 0`)
    /// rather than after it.
    fn checks_before_step(self) -> bool {
        !matches!(self, PaymentPolicy::CappedInstalments)
    }
}

/// What a run reports, and therefore how it terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    /// Cumulative amount repaid; stops when the loan is paid off.
    TotalRepaid,
    /// Number of months elapsed; stops when the loan is paid off.
    MonthCount,
    /// Balance after every 12th month; always runs the full horizon.
    YearEnd,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Parameters of one forward simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub opening_balance: Money,
    pub monthly_rate: Rate,
    pub minimum_payment: Money,
    pub extra_contribution: Money,
    /// 0-based month index from which the extra contribution applies
    pub extra_start_month: u32,
    /// Hard upper bound on the number of steps
    pub horizon_months: u32,
}

/// Result of applying one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthStep {
    pub balance: Money,
    /// Amount paid towards the loan this month
    pub repaid: Money,
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub policy: PaymentPolicy,
    pub granularity: Granularity,
    pub months_elapsed: u32,
    pub total_repaid: Money,
    pub closing_balance: Money,
    /// Populated only for [`Granularity::YearEnd`]
    pub year_end_balances: Vec<Money>,
}

impl Simulation {
    fn extra_active(&self, month: u32) -> bool {
        month >= self.extra_start_month
    }

    /// Apply month `month` (0-based) to `balance` under `policy`.
    pub fn step(
        &self,
        policy: PaymentPolicy,
        month: u32,
        balance: Money,
    ) -> LoanCalcResult<MonthStep> {
        match policy {
            PaymentPolicy::CappedInstalments => {
                let mut balance = balance;
                let mut repaid = Decimal::ZERO;

                if balance > Decimal::ZERO {
                    let interest = checked_mul(balance, self.monthly_rate, "monthly interest")?;
                    balance = checked_add(balance, interest, "interest accrual")?;
                }

                if self.extra_active(month) && self.extra_contribution > Decimal::ZERO {
                    let extra = self.extra_contribution.min(balance);
                    balance = checked_sub(balance, extra, "extra contribution")?;
                    repaid = checked_add(repaid, extra, "extra contribution")?;
                }

                let minimum = self.minimum_payment.min(balance);
                balance = checked_sub(balance, minimum, "minimum payment")?;
                repaid = checked_add(repaid, minimum, "minimum payment")?;

                Ok(MonthStep { balance, repaid })
            }
            PaymentPolicy::MinimumOnly => {
                let balance = self.accrue_and_pay(balance, self.minimum_payment)?;
                Ok(MonthStep {
                    balance,
                    repaid: self.minimum_payment,
                })
            }
            PaymentPolicy::ExtraBeforeInterest => {
                let mut balance = balance;
                let mut repaid = self.minimum_payment;
                if self.extra_active(month) {
                    balance = checked_sub(balance, self.extra_contribution, "extra contribution")?;
                    repaid = checked_add(repaid, self.extra_contribution, "extra contribution")?;
                }
                let balance = self.accrue_and_pay(balance, self.minimum_payment)?;
                Ok(MonthStep {
                    balance: balance.max(Decimal::ZERO),
                    repaid,
                })
            }
            PaymentPolicy::CombinedClamped => {
                let payment = if self.extra_active(month) {
                    checked_add(self.minimum_payment, self.extra_contribution, "combined payment")?
                } else {
                    self.minimum_payment
                };
                let balance = self.accrue_and_pay(balance, payment)?;
                Ok(MonthStep {
                    balance: balance.max(Decimal::ZERO),
                    repaid: payment,
                })
            }
        }
    }

    /// `balance * (1 + r) - payment`
    fn accrue_and_pay(&self, balance: Money, payment: Money) -> LoanCalcResult<Money> {
        let growth = checked_add(Decimal::ONE, self.monthly_rate, "monthly growth factor")?;
        let accrued = checked_mul(balance, growth, "balance accrual")?;
        checked_sub(accrued, payment, "monthly payment")
    }

    /// Run the simulation from `opening_balance` until it terminates.
    ///
    /// Paid-off detection follows the policy (before or after each step)
    /// except under [`Granularity::YearEnd`], which always runs to the
    /// horizon. No run exceeds `horizon_months` steps.
    pub fn run(
        &self,
        policy: PaymentPolicy,
        granularity: Granularity,
    ) -> LoanCalcResult<SimulationReport> {
        let full_horizon = granularity == Granularity::YearEnd;
        let check_before = !full_horizon && policy.checks_before_step();
        let check_after = !full_horizon && !policy.checks_before_step();

        let mut balance = self.opening_balance;
        let mut total_repaid = Decimal::ZERO;
        let mut year_end_balances = Vec::new();
        let mut month: u32 = 0;

        while month < self.horizon_months {
            if check_before && balance <= Decimal::ZERO {
                break;
            }

            let step = self.step(policy, month, balance)?;
            balance = step.balance;
            total_repaid = checked_add(total_repaid, step.repaid, "total repaid")?;
            month += 1;

            if full_horizon && month % 12 == 0 {
                year_end_balances.push(balance);
            }
            if check_after && balance <= Decimal::ZERO {
                break;
            }
        }

        Ok(SimulationReport {
            policy,
            granularity,
            months_elapsed: month,
            total_repaid,
            closing_balance: balance,
            year_end_balances,
        })
    }
}

// ---------------------------------------------------------------------------
// Checked decimal arithmetic
// ---------------------------------------------------------------------------

fn overflow(context: &str) -> LoanCalcError {
    LoanCalcError::Overflow {
        context: context.to_string(),
    }
}

pub(crate) fn checked_mul(a: Decimal, b: Decimal, context: &str) -> LoanCalcResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(context))
}

pub(crate) fn checked_add(a: Decimal, b: Decimal, context: &str) -> LoanCalcResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(context))
}

pub(crate) fn checked_sub(a: Decimal, b: Decimal, context: &str) -> LoanCalcResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(context))
}
