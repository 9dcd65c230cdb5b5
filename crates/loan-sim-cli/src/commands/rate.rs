use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::rate_solver::bisection::{self, RateSolverInput};

use crate::input;

/// Arguments for implied-rate solving
#[derive(Args)]
pub struct SolveRateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Level installment quoted by the lender
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Number of installments
    #[arg(long)]
    pub term: Option<u32>,

    /// Installments per year, used to annualize the result
    #[arg(long)]
    pub periods_per_year: Option<u32>,
}

pub fn run_solve_rate(args: SolveRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let solver_input: RateSolverInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => RateSolverInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            payment: args
                .payment
                .ok_or("--payment is required (or provide --input)")?,
            term: args.term.ok_or("--term is required (or provide --input)")?,
            periods_per_year: args.periods_per_year,
        },
    };

    let result = bisection::solve_rate(&solver_input)?;
    Ok(serde_json::to_value(result)?)
}
