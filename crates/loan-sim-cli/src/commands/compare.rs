use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::amortization::comparison::{self, ComparisonInput, LoanScenario};
use loan_sim_core::amortization::schedule::LoanInput;
use loan_sim_core::AmortizationMethod;

use crate::input;

/// Arguments for scenario comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON file with named scenarios (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed; with --rate and --term compares Price against SAC
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Monthly rate as a decimal
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let comparison_input: ComparisonInput =
        match input::from_file_or_stdin(args.input.as_deref())? {
            Some(parsed) => parsed,
            None => {
                let principal = args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?;
                let rate = args.rate.ok_or("--rate is required (or provide --input)")?;
                let term = args.term.ok_or("--term is required (or provide --input)")?;
                let scenario = |name: &str, method| LoanScenario {
                    name: name.into(),
                    loan: LoanInput {
                        principal,
                        periodic_rate: rate,
                        term,
                        method,
                        extra_payment: None,
                        transaction_tax: None,
                    },
                };
                ComparisonInput {
                    scenarios: vec![
                        scenario("price", AmortizationMethod::ConstantPayment),
                        scenario("sac", AmortizationMethod::ConstantPrincipal),
                    ],
                }
            }
        };

    let result = comparison::compare_scenarios(&comparison_input)?;
    Ok(serde_json::to_value(result)?)
}
