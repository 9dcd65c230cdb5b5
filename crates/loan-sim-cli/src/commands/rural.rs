use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::rural::grace_period::{self, GraceFrequency, GraceTreatment, RuralInput};

use super::MethodArg;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TreatmentArg {
    PayPeriodically,
    PayAtEnd,
    Capitalize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GraceFrequencyArg {
    Annual,
    Semiannual,
    Quarterly,
    Monthly,
}

/// Arguments for a rural financing schedule
#[derive(Args)]
pub struct RuralArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount financed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual rate as a decimal (0.08 = 8%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Total term in years, grace included
    #[arg(long)]
    pub total_years: Option<u32>,

    /// Grace period in years
    #[arg(long, default_value_t = 0)]
    pub grace_years: u32,

    /// Amortization method after the grace period
    #[arg(long, value_enum, default_value = "price")]
    pub method: MethodArg,

    /// Treatment of interest during the grace period
    #[arg(long, value_enum, default_value = "pay-periodically")]
    pub grace_treatment: TreatmentArg,

    /// Installments per year when grace interest is paid periodically
    #[arg(long, value_enum)]
    pub grace_frequency: Option<GraceFrequencyArg>,
}

pub fn run_rural(args: RuralArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rural_input: RuralInput = match input::from_file_or_stdin(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => RuralInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            total_years: args
                .total_years
                .ok_or("--total-years is required (or provide --input)")?,
            grace_years: args.grace_years,
            method: args.method.into(),
            grace_treatment: match args.grace_treatment {
                TreatmentArg::PayPeriodically => GraceTreatment::PayPeriodically,
                TreatmentArg::PayAtEnd => GraceTreatment::PayAtEnd,
                TreatmentArg::Capitalize => GraceTreatment::Capitalize,
            },
            grace_frequency: args.grace_frequency.map(|f| match f {
                GraceFrequencyArg::Annual => GraceFrequency::Annual,
                GraceFrequencyArg::Semiannual => GraceFrequency::Semiannual,
                GraceFrequencyArg::Quarterly => GraceFrequency::Quarterly,
                GraceFrequencyArg::Monthly => GraceFrequency::Monthly,
            }),
        },
    };

    let result = grace_period::compute_rural_schedule(&rural_input)?;
    Ok(serde_json::to_value(result)?)
}
