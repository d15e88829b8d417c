mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::loan::{AnalyzeArgs, LoanArgs};
use commands::sensitivity::SensitivityArgs;

/// Loan repayment and extra-contribution savings calculator
#[derive(Parser)]
#[command(
    name = "loancalc",
    version,
    about = "Loan repayment and extra-contribution savings calculator",
    long_about = "Computes the level monthly repayment of an amortising loan and the \
                  interest and time saved by paying an extra amount each month, \
                  optionally starting after a number of years. All arithmetic is \
                  decimal-precise."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly repayment, interest saved and months saved
    Repayment(LoanArgs),
    /// Full analysis with totals, payoff dates and display strings
    Analyze(AnalyzeArgs),
    /// Year-end balances with and without the extra contribution
    Trajectory(LoanArgs),
    /// Sweep one input and report savings at each value
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Repayment(args) => commands::loan::run_repayment(args),
        Commands::Analyze(args) => commands::loan::run_analyze(args),
        Commands::Trajectory(args) => commands::loan::run_trajectory(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("loancalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
