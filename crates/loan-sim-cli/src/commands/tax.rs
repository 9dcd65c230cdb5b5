use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::tax::{self, TaxInput, TaxTerm};

use crate::input;

/// Arguments for the transaction tax calculation
#[derive(Args)]
pub struct TaxArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Principal of the operation
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Operation length in calendar days
    #[arg(long, conflicts_with = "months")]
    pub days: Option<u32>,

    /// Operation length in months (30-day months)
    #[arg(long)]
    pub months: Option<u32>,
}

pub fn run_tax(args: TaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: TaxInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let term = match (args.days, args.months) {
                (Some(d), _) => TaxTerm::Days(d),
                (None, Some(m)) => TaxTerm::Months(m),
                (None, None) => {
                    return Err("--days or --months is required (or provide --input)".into())
                }
            };
            TaxInput {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                term,
            }
        }
    };

    let result = tax::compute_transaction_tax(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}
