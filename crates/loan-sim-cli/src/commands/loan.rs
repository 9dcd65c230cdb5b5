use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::amortization::extra_payments::{
    ExtraFrequency, ExtraGoal, ExtraPaymentOverlay,
};
use loan_sim_core::amortization::schedule::{self, LoanInput};
use loan_sim_core::tax::TaxTreatment;
use loan_sim_core::time_value::periodic_rate_from_annual;

use super::MethodArg;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    OneTime,
    EveryPeriod,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GoalArg {
    ShortenTerm,
    ReducePayment,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TaxArg {
    /// Roll the tax into the financed amount
    Financed,
    /// Pay the tax up front
    Separate,
}

/// Arguments for a loan amortization schedule
#[derive(Args)]
pub struct LoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Monthly rate as a decimal (0.01 = 1%)
    #[arg(long, conflicts_with = "annual_rate")]
    pub rate: Option<Decimal>,

    /// Annual effective rate, converted to its monthly equivalent
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term: Option<u32>,

    /// Amortization method
    #[arg(long, value_enum, default_value = "price")]
    pub method: MethodArg,

    /// Extra principal paid on top of the installment
    #[arg(long)]
    pub extra_amount: Option<Decimal>,

    /// Month of the first extra payment
    #[arg(long, default_value_t = 1)]
    pub extra_start: u32,

    /// Whether the extra payment happens once or every month
    #[arg(long, value_enum, default_value = "one-time")]
    pub extra_frequency: FrequencyArg,

    /// What the extra payment should achieve
    #[arg(long, value_enum, default_value = "shorten-term")]
    pub extra_goal: GoalArg,

    /// Include the transaction tax
    #[arg(long, value_enum)]
    pub tax: Option<TaxArg>,
}

pub fn run_loan(args: LoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => loan_from_flags(&args)?,
    };

    let result = schedule::compute_schedule(&loan_input)?;
    Ok(serde_json::to_value(result)?)
}

fn loan_from_flags(args: &LoanArgs) -> Result<LoanInput, Box<dyn std::error::Error>> {
    let periodic_rate = match (args.rate, args.annual_rate) {
        (Some(r), _) => r,
        (None, Some(annual)) => periodic_rate_from_annual(annual, 12)?,
        (None, None) => {
            return Err("--rate or --annual-rate is required (or provide --input)".into())
        }
    };

    let extra_payment = args.extra_amount.map(|amount| ExtraPaymentOverlay {
        amount,
        start_period: args.extra_start,
        frequency: match args.extra_frequency {
            FrequencyArg::OneTime => ExtraFrequency::OneTime,
            FrequencyArg::EveryPeriod => ExtraFrequency::EveryPeriod,
        },
        goal: match args.extra_goal {
            GoalArg::ShortenTerm => ExtraGoal::ShortenTerm,
            GoalArg::ReducePayment => ExtraGoal::ReducePayment,
        },
    });

    Ok(LoanInput {
        principal: args
            .principal
            .ok_or("--principal is required (or provide --input)")?,
        periodic_rate,
        term: args.term.ok_or("--term is required (or provide --input)")?,
        method: args.method.into(),
        extra_payment,
        transaction_tax: args.tax.map(|t| match t {
            TaxArg::Financed => TaxTreatment::Financed,
            TaxArg::Separate => TaxTreatment::PaidSeparately,
        }),
    })
}
