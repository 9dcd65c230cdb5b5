mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::checks::CheckDiscountArgs;
use commands::compare::CompareArgs;
use commands::loan::LoanArgs;
use commands::rate::SolveRateArgs;
use commands::rural::RuralArgs;
use commands::tax::TaxArgs;

/// Loan, rural financing, rate and check discount simulations
#[derive(Parser)]
#[command(
    name = "lsim",
    version,
    about = "Loan, rural financing, rate and check discount simulations",
    long_about = "A CLI for personal-finance simulations with decimal precision. \
                  Supports Price and SAC amortization with extra payments, rural \
                  financing with grace periods, transaction tax, implied-rate \
                  solving, check discounting and scenario comparison."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true, env = "LOAN_SIM_OUTPUT")]
    output: OutputFormat,

    /// Log filter for diagnostics on stderr (e.g. debug, loan_sim_core=trace)
    #[arg(long, default_value = "warn", global = true, env = "LOAN_SIM_LOG")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Amortization schedule for a loan (Price or SAC), with optional extra payments
    Loan(LoanArgs),
    /// Rural financing schedule with a grace period
    Rural(RuralArgs),
    /// Transaction tax on a credit operation
    Tax(TaxArgs),
    /// Implied periodic rate from principal, payment and term
    SolveRate(SolveRateArgs),
    /// Net value of discounted post-dated checks
    CheckDiscount(CheckDiscountArgs),
    /// Compare loan scenarios side by side
    Compare(CompareArgs),
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

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Loan(args) => commands::loan::run_loan(args),
        Commands::Rural(args) => commands::rural::run_rural(args),
        Commands::Tax(args) => commands::tax::run_tax(args),
        Commands::SolveRate(args) => commands::rate::run_solve_rate(args),
        Commands::CheckDiscount(args) => commands::checks::run_check_discount(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Version => {
            println!("lsim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
