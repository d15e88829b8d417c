use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use loan_calc_core::amortization::analysis::{self, LoanAnalysisInput};
use loan_calc_core::amortization::engine;
use loan_calc_core::sanitize::{self, RawLoanInputs};
use loan_calc_core::types::{with_metadata, Money};

use crate::input;

/// Loan parameters. Every value is free text and is cleaned the same way the
/// calculator form cleans it, so "$300,000", "5.5%" and "30 years" all work.
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount (e.g. "$300,000")
    #[arg(long)]
    pub principal: Option<String>,

    /// Annual interest rate in percent (e.g. "5.5%")
    #[arg(long)]
    pub rate: Option<String>,

    /// Loan term in whole years (e.g. "30 years")
    #[arg(long)]
    pub term: Option<String>,

    /// Extra monthly contribution (e.g. "$200")
    #[arg(long)]
    pub extra: Option<String>,

    /// Whole years before the extra contribution starts
    #[arg(long)]
    pub start_after: Option<String>,

    /// First payment date (YYYY-MM-DD); adds projected payoff dates
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

/// Arguments for the full analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub loan: LoanArgs,

    /// Include the yearly balance trajectory in the output
    #[arg(long)]
    pub with_trajectory: bool,
}

/// One chart row: both balances at the end of a year.
#[derive(Debug, Serialize)]
struct TrajectoryRow {
    year: u32,
    with_extra: Money,
    without_extra: Money,
}

/// Resolve loan input from --input, piped stdin, or individual flags.
pub fn load_loan(args: &LoanArgs) -> Result<LoanAnalysisInput, Box<dyn std::error::Error>> {
    if let Some(input) = input::load::<LoanAnalysisInput>(args.input.as_deref())? {
        return Ok(input);
    }

    let raw = RawLoanInputs {
        principal: args
            .principal
            .clone()
            .ok_or("--principal is required (or provide --input)")?,
        annual_rate: args
            .rate
            .clone()
            .ok_or("--rate is required (or provide --input)")?,
        term: args
            .term
            .clone()
            .ok_or("--term is required (or provide --input)")?,
        extra_contribution: args.extra.clone().unwrap_or_default(),
        start_after: args.start_after.clone().unwrap_or_default(),
    };

    Ok(LoanAnalysisInput {
        loan: sanitize::parse_loan_inputs(&raw)?,
        start_date: args.start_date,
    })
}

pub fn run_repayment(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let input = load_loan(&args)?;
    let summary = engine::repayment_summary(&input.loan)?;
    let elapsed = start.elapsed().as_micros() as u64;
    let output = with_metadata(
        "Level-Payment Amortisation",
        &input.loan,
        Vec::new(),
        elapsed,
        summary,
    );
    Ok(serde_json::to_value(output)?)
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = load_loan(&args.loan)?;
    let result = analysis::analyze_loan(&input)?;
    let mut value = serde_json::to_value(result)?;
    if !args.with_trajectory {
        if let Some(Value::Object(result)) = value.get_mut("result") {
            result.remove("trajectory");
        }
    }
    Ok(value)
}

pub fn run_trajectory(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = load_loan(&args)?;
    let trajectory = engine::balance_trajectory(&input.loan)?;
    let rows: Vec<TrajectoryRow> = trajectory
        .with_extra
        .iter()
        .zip(trajectory.without_extra.iter())
        .map(|(with, without)| TrajectoryRow {
            year: with.year,
            with_extra: with.balance,
            without_extra: without.balance,
        })
        .collect();
    Ok(serde_json::to_value(rows)?)
}
