use chrono::{Local, NaiveDate};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::check_discount::discount::{self, CheckDiscountInput, CheckItem};

use crate::input;

/// Arguments for check discounting
#[derive(Args)]
pub struct CheckDiscountArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Check as AMOUNT@YYYY-MM-DD; repeat for each check
    #[arg(long = "check", value_parser = parse_check)]
    pub checks: Vec<CheckItem>,

    /// Monthly discount rate as a decimal (0.03 = 3%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Discount date (defaults to today)
    #[arg(long)]
    pub valuation_date: Option<NaiveDate>,

    /// Charge the transaction tax
    #[arg(long)]
    pub tax: bool,

    /// Fixed fee charged on the operation
    #[arg(long, default_value_t = Decimal::ZERO)]
    pub fee: Decimal,
}

fn parse_check(raw: &str) -> Result<CheckItem, String> {
    let (amount, date) = raw
        .split_once('@')
        .ok_or_else(|| format!("expected AMOUNT@YYYY-MM-DD, got '{raw}'"))?;
    let amount: Decimal = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount '{amount}': {e}"))?;
    let due_date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{date}': {e}"))?;
    Ok(CheckItem { amount, due_date })
}

pub fn run_check_discount(args: CheckDiscountArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let discount_input: CheckDiscountInput =
        match input::from_file_or_stdin(args.input.as_deref())? {
            Some(parsed) => parsed,
            None => {
                if args.checks.is_empty() {
                    return Err("at least one --check is required (or provide --input)".into());
                }
                CheckDiscountInput {
                    checks: args.checks,
                    valuation_date: args
                        .valuation_date
                        .unwrap_or_else(|| Local::now().date_naive()),
                    monthly_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
                    apply_tax: args.tax,
                    fixed_fee: args.fee,
                }
            }
        };

    let result = discount::compute_discount(&discount_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_check() {
        let check = parse_check("1500.50@2025-02-28").unwrap();
        assert_eq!(check.amount, dec!(1500.50));
        assert_eq!(check.due_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn test_parse_check_rejects_malformed() {
        assert!(parse_check("1500.50").is_err());
        assert!(parse_check("abc@2025-02-28").is_err());
        assert!(parse_check("100@2025-02-30").is_err());
    }
}
