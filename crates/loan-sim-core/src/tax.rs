//! Day-count transaction tax levied on credit operations.
//!
//! Two components: a flat percentage of the principal and a daily accrual
//! capped at one year. Loan terms quoted in months use a 30-day month.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

/// Flat component, charged once on the principal.
pub const FIXED_TAX_RATE: Rate = dec!(0.0038);

/// Daily component, charged per elapsed day.
pub const DAILY_TAX_RATE: Rate = dec!(0.000082);

/// Days beyond this cap accrue no further daily tax.
pub const MAX_TAX_DAYS: u32 = 365;

/// Days per month when a term is quoted in months.
pub const DAYS_PER_MONTH: u32 = 30;

/// Length of the taxed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxTerm {
    Days(u32),
    Months(u32),
}

impl TaxTerm {
    /// Calendar days subject to the daily component, after the cap.
    pub fn taxable_days(&self) -> u32 {
        let days = match self {
            TaxTerm::Days(d) => *d,
            TaxTerm::Months(m) => m.saturating_mul(DAYS_PER_MONTH),
        };
        days.min(MAX_TAX_DAYS)
    }
}

/// Whether a loan's transaction tax is rolled into the financed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxTreatment {
    /// Added to the principal before the installment is computed.
    Financed,
    /// Paid up front by the borrower; principal is unchanged.
    PaidSeparately,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxInput {
    pub principal: Money,
    pub term: TaxTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub fixed_component: Money,
    pub daily_component: Money,
    pub taxable_days: u32,
    pub total: Money,
}

/// Tax on `principal` outstanding for `days` calendar days (capped at 365).
pub fn transaction_tax(principal: Money, days: u32) -> TaxBreakdown {
    let taxable_days = days.min(MAX_TAX_DAYS);
    let fixed_component = principal * FIXED_TAX_RATE;
    let daily_component = principal * DAILY_TAX_RATE * Decimal::from(taxable_days);
    TaxBreakdown {
        fixed_component,
        daily_component,
        taxable_days,
        total: fixed_component + daily_component,
    }
}

/// Daily component alone, used where the flat part is levied on an aggregate.
pub fn daily_tax(amount: Money, days: u32) -> Money {
    amount * DAILY_TAX_RATE * Decimal::from(days.min(MAX_TAX_DAYS))
}

/// Compute the transaction tax for a principal and an operation term.
pub fn compute_transaction_tax(
    input: &TaxInput,
) -> LoanSimResult<ComputationOutput<TaxBreakdown>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    if input.principal < Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "principal",
            "Principal cannot be negative",
        ));
    }

    let days = match input.term {
        TaxTerm::Days(d) => d,
        TaxTerm::Months(m) => m.saturating_mul(DAYS_PER_MONTH),
    };
    if days > MAX_TAX_DAYS {
        warnings.push(format!(
            "Term of {days} days exceeds the {MAX_TAX_DAYS}-day cap; daily component capped"
        ));
    }

    let breakdown = transaction_tax(input.principal, input.term.taxable_days());
    tracing::debug!(
        principal = %input.principal,
        days = breakdown.taxable_days,
        total = %breakdown.total,
        "computed transaction tax"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Transaction tax: fixed 0.38% plus 0.0082% per day (365-day cap)",
        input,
        warnings,
        elapsed,
        breakdown,
    ))
}
