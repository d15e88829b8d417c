//! Display formatting for calculator results.
//!
//! en-US conventions only: `$` prefix, comma thousands separators, two
//! decimal places for currency.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::engine::{BalancePoint, BalanceTrajectory};
use crate::types::{Money, Percent};

/// Label of the series that includes extra contributions.
pub const WITH_EXTRA_LABEL: &str = "With Extra";
/// Label of the minimum-payment series.
pub const WITHOUT_EXTRA_LABEL: &str = "Without Extra";

const AXIS_THOUSANDS_THRESHOLD: Decimal = dec!(2000);

/// The four result lines shown under the calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySummary {
    pub minimum_repayments: String,
    pub increased_repayments: String,
    pub time_saved: String,
    pub interest_saved: String,
}

/// One labelled line series for a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub points: Vec<BalancePoint>,
}

/// Format a currency amount: `$1,610.46`, `-$12.50`.
pub fn format_currency(amount: Money) -> String {
    format_dollars(amount, 2)
}

/// Format a currency amount with no cents: `$300,000`.
pub fn format_whole_currency(amount: Money) -> String {
    format_dollars(amount, 0)
}

/// Format a rate the way it is typed: `5.5%`.
pub fn format_percentage(value: Percent) -> String {
    format!("{}%", value.normalize())
}

/// Format a year count: `1 year`, `30 years`. Zero reads `0 year`.
pub fn format_years(years: u32) -> String {
    if years > 1 {
        format!("{years} years")
    } else {
        format!("{years} year")
    }
}

/// Format a month count as `"{y} years and {m} months"`.
///
/// Years are floored, months are the truncating remainder, so a negative
/// count reads e.g. `-1 years and -5 months`.
pub fn format_duration(months: i64) -> String {
    let years = months.div_euclid(12);
    let rem = months % 12;
    format!(
        "{} {} and {} {}",
        years,
        plural(years, "year"),
        rem,
        plural(rem, "month")
    )
}

/// Y-axis tick label: `$1500` up to 2000, `$250k` above.
pub fn axis_tick_label(value: Money) -> String {
    if value <= AXIS_THOUSANDS_THRESHOLD {
        format!("${}", round_half_away(value, 0))
    } else {
        format!("${}k", round_half_away(value / dec!(1000), 0))
    }
}

/// Tooltip lines for one chart point: amount rounded to whole dollars.
pub fn tooltip_label(point: &BalancePoint) -> [String; 2] {
    [
        format!("Amount: {}", format_whole_currency(point.balance)),
        format!("Year: {}", point.year),
    ]
}

/// The two labelled datasets of a trajectory, "With Extra" first.
pub fn chart_datasets(trajectory: &BalanceTrajectory) -> Vec<ChartDataset> {
    vec![
        ChartDataset {
            label: WITH_EXTRA_LABEL.to_string(),
            points: trajectory.with_extra.clone(),
        },
        ChartDataset {
            label: WITHOUT_EXTRA_LABEL.to_string(),
            points: trajectory.without_extra.clone(),
        },
    ]
}

/// Build the four display strings from raw results. `increased_repayment`
/// is the minimum plus the extra contribution.
pub fn display_summary(
    monthly_repayment: Money,
    increased_repayment: Money,
    interest_saved: Money,
    months_saved: i64,
) -> DisplaySummary {
    DisplaySummary {
        minimum_repayments: format_currency(monthly_repayment),
        increased_repayments: format_currency(increased_repayment),
        time_saved: format_duration(months_saved),
        interest_saved: format_currency(interest_saved),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn format_dollars(amount: Money, dp: u32) -> String {
    let rounded = round_half_away(amount, dp);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let s = format!("{:.*}", dp as usize, rounded.abs());
    format!("{sign}${}", add_thousands_separator(&s))
}

/// Add thousands separators to a number string.
fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (s, None),
    };

    let chars: Vec<char> = integer_part.chars().rev().collect();
    let formatted: String = chars
        .chunks(3)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<String>>()
        .join(",")
        .chars()
        .rev()
        .collect();

    match decimal_part {
        Some(dec) => format!("{formatted}.{dec}"),
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(1610.464869)), "$1,610.46");
        assert_eq!(format_currency(dec!(69210.3692)), "$69,210.37");
        assert_eq!(format_currency(dec!(0.005)), "$0.01");
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
        assert_eq!(format_currency(dec!(-12.5)), "-$12.50");
        assert_eq!(format_currency(dec!(1234567.891)), "$1,234,567.89");
    }

    #[test]
    fn test_format_whole_currency() {
        assert_eq!(format_whole_currency(dec!(300000)), "$300,000");
        assert_eq!(format_whole_currency(dec!(999.5)), "$1,000");
        assert_eq!(format_whole_currency(dec!(-0.4)), "$0");
    }

    #[test]
    fn test_format_percentage_and_years() {
        assert_eq!(format_percentage(dec!(5.50)), "5.5%");
        assert_eq!(format_percentage(dec!(6)), "6%");
        assert_eq!(format_years(30), "30 years");
        assert_eq!(format_years(1), "1 year");
        assert_eq!(format_years(0), "0 year");
    }

    #[test]
    fn test_format_duration_pluralisation() {
        assert_eq!(format_duration(78), "6 years and 6 months");
        assert_eq!(format_duration(13), "1 year and 1 month");
        assert_eq!(format_duration(12), "1 year and 0 months");
        assert_eq!(format_duration(0), "0 years and 0 months");
        assert_eq!(format_duration(-5), "-1 years and -5 months");
    }

    #[test]
    fn test_axis_tick_label() {
        assert_eq!(axis_tick_label(dec!(1500)), "$1500");
        assert_eq!(axis_tick_label(dec!(2000)), "$2000");
        assert_eq!(axis_tick_label(dec!(2500)), "$3k");
        assert_eq!(axis_tick_label(dec!(300000)), "$300k");
        assert_eq!(axis_tick_label(Decimal::ZERO), "$0");
    }

    #[test]
    fn test_tooltip_label() {
        let point = BalancePoint {
            year: 3,
            balance: dec!(123456.7),
        };
        assert_eq!(
            tooltip_label(&point),
            ["Amount: $123,457".to_string(), "Year: 3".to_string()]
        );
    }

    #[test]
    fn test_chart_datasets_labels() {
        let traj = BalanceTrajectory {
            with_extra: vec![BalancePoint {
                year: 0,
                balance: dec!(10),
            }],
            without_extra: vec![BalancePoint {
                year: 0,
                balance: dec!(10),
            }],
        };
        let sets = chart_datasets(&traj);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].label, "With Extra");
        assert_eq!(sets[1].label, "Without Extra");
    }

    #[test]
    fn test_display_summary() {
        let summary = display_summary(dec!(1610.4649), dec!(1810.4649), dec!(69210.369), 78);
        assert_eq!(summary.minimum_repayments, "$1,610.46");
        assert_eq!(summary.increased_repayments, "$1,810.46");
        assert_eq!(summary.time_saved, "6 years and 6 months");
        assert_eq!(summary.interest_saved, "$69,210.37");
    }

    #[test]
    fn test_add_thousands_separator() {
        assert_eq!(add_thousands_separator("1234567.89"), "1,234,567.89");
        assert_eq!(add_thousands_separator("100"), "100");
        assert_eq!(add_thousands_separator("1000"), "1,000");
    }
}
