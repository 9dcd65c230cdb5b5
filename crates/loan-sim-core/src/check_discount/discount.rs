//! Check discounting: advance the face value of post-dated checks net of
//! interest, transaction tax and a fixed fee.
//!
//! Interest accrues simply on a 30-day month (`face * rate * days / 30`),
//! while the tax's daily component counts calendar days capped at 365.
//! Checks due on or before the valuation date carry no interest and no daily
//! tax.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::tax::{daily_tax, FIXED_TAX_RATE};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

const DAYS_PER_MONTH: Decimal = dec!(30);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckItem {
    pub amount: Money,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDiscountInput {
    pub checks: Vec<CheckItem>,
    /// Date the checks are discounted.
    pub valuation_date: NaiveDate,
    /// Monthly discount rate.
    pub monthly_rate: Rate,
    #[serde(default)]
    pub apply_tax: bool,
    #[serde(default)]
    pub fixed_fee: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckBreakdown {
    pub due_date: NaiveDate,
    pub amount: Money,
    /// Days from valuation to due date; zero or negative when already due.
    pub days: i64,
    pub interest: Money,
    pub daily_tax: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDiscountOutput {
    pub checks: Vec<CheckBreakdown>,
    pub total_face_value: Money,
    pub total_interest: Money,
    pub tax: Money,
    pub fixed_fee: Money,
    pub total_cost: Money,
    pub net_amount: Money,
    /// Total cost as a fraction of face value.
    pub effective_cost_rate: Rate,
    /// Face-weighted average days to maturity of checks not yet due.
    pub average_days: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a set of checks discounted on `valuation_date`.
pub fn compute_discount(
    input: &CheckDiscountInput,
) -> LoanSimResult<ComputationOutput<CheckDiscountOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_discount(input)?;

    let mut checks = Vec::with_capacity(input.checks.len());
    let mut total_face_value = Decimal::ZERO;
    let mut total_interest = Decimal::ZERO;
    let mut total_daily_tax = Decimal::ZERO;
    let mut weighted_days = Decimal::ZERO;
    let mut pending_face = Decimal::ZERO;

    for check in &input.checks {
        let days = (check.due_date - input.valuation_date).num_days();
        total_face_value += check.amount;

        let (interest, tax) = if days > 0 {
            let interest =
                check.amount * input.monthly_rate * Decimal::from(days) / DAYS_PER_MONTH;
            let tax = if input.apply_tax {
                daily_tax(check.amount, u32::try_from(days).unwrap_or(u32::MAX))
            } else {
                Decimal::ZERO
            };
            weighted_days += check.amount * Decimal::from(days);
            pending_face += check.amount;
            (interest, tax)
        } else {
            warnings.push(format!(
                "Check of {} due {} is already due; no discount applied",
                check.amount, check.due_date
            ));
            (Decimal::ZERO, Decimal::ZERO)
        };

        total_interest += interest;
        total_daily_tax += tax;
        checks.push(CheckBreakdown {
            due_date: check.due_date,
            amount: check.amount,
            days,
            interest,
            daily_tax: tax,
        });
    }

    let tax = if input.apply_tax {
        total_face_value * FIXED_TAX_RATE + total_daily_tax
    } else {
        Decimal::ZERO
    };
    let total_cost = total_interest + tax + input.fixed_fee;
    let net_amount = total_face_value - total_cost;
    if net_amount < Decimal::ZERO {
        warnings.push("Discount cost exceeds the face value of the checks".into());
    }

    tracing::debug!(
        checks = checks.len(),
        face = %total_face_value,
        cost = %total_cost,
        "check discount computed"
    );

    let output = CheckDiscountOutput {
        checks,
        total_face_value,
        total_interest,
        tax,
        fixed_fee: input.fixed_fee,
        total_cost,
        net_amount,
        effective_cost_rate: total_cost / total_face_value,
        average_days: if pending_face.is_zero() {
            Decimal::ZERO
        } else {
            weighted_days / pending_face
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Simple-interest check discount (30-day month) with day-count tax",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn validate_discount(input: &CheckDiscountInput) -> LoanSimResult<()> {
    if input.checks.is_empty() {
        return Err(LoanSimError::InsufficientData(
            "At least one check is required".into(),
        ));
    }
    for (i, check) in input.checks.iter().enumerate() {
        if check.amount <= Decimal::ZERO {
            return Err(LoanSimError::InvalidInput {
                field: format!("checks[{i}].amount"),
                reason: "Check amount must be positive".into(),
            });
        }
    }
    if input.monthly_rate < Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "monthly_rate",
            "Discount rate cannot be negative",
        ));
    }
    if input.fixed_fee < Decimal::ZERO {
        return Err(LoanSimError::invalid("fixed_fee", "Fee cannot be negative"));
    }
    Ok(())
}
