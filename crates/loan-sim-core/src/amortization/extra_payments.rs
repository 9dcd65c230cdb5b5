use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LoanSimError;
use crate::types::Money;
use crate::LoanSimResult;

/// How often the extra payment recurs once it starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraFrequency {
    #[default]
    OneTime,
    EveryPeriod,
}

/// What the borrower wants out of the extra payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraGoal {
    /// Keep the installment, finish earlier.
    #[default]
    ShortenTerm,
    /// Keep the end date, re-amortize the remaining balance into a smaller installment.
    ReducePayment,
}

/// Extra principal paid on top of the scheduled installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraPaymentOverlay {
    pub amount: Money,
    /// 1-based period in which the first extra payment is made.
    pub start_period: u32,
    #[serde(default)]
    pub frequency: ExtraFrequency,
    #[serde(default)]
    pub goal: ExtraGoal,
}

impl ExtraPaymentOverlay {
    pub fn validate(&self, term: u32) -> LoanSimResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LoanSimError::invalid(
                "extra_payment.amount",
                "Extra payment must be positive",
            ));
        }
        if self.start_period == 0 || self.start_period > term {
            return Err(LoanSimError::invalid(
                "extra_payment.start_period",
                format!("Start period must be between 1 and the term ({term})"),
            ));
        }
        Ok(())
    }

    /// Whether an extra payment falls in `period`.
    pub fn applies_to(&self, period: u32) -> bool {
        match self.frequency {
            ExtraFrequency::OneTime => period == self.start_period,
            ExtraFrequency::EveryPeriod => period >= self.start_period,
        }
    }

    /// Extra principal for `period`, never more than `headroom` (the balance
    /// left after ordinary amortization).
    pub fn amount_for(&self, period: u32, headroom: Money) -> Money {
        if !self.applies_to(period) || headroom <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.amount.min(headroom)
    }
}

/// Effect of the extra payments measured against the plain schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraAmortizationSummary {
    pub total_extra_principal: Money,
    /// Baseline total interest minus actual total interest.
    pub interest_saved: Money,
    pub original_term: u32,
    pub realized_term: u32,
    pub periods_saved: u32,
    pub goal: ExtraGoal,
}
