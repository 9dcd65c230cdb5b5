//! Period-by-period loan amortization (Price and SAC) with an optional
//! extra-payment overlay.
//!
//! The schedule is produced by threading a [`ScheduleState`] through
//! [`step`]: each call consumes the state for one period and returns the next
//! state together with the emitted row. A baseline run without extra payments
//! is used to report the interest the overlay saves.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::extra_payments::{ExtraAmortizationSummary, ExtraGoal, ExtraPaymentOverlay};
use crate::error::LoanSimError;
use crate::tax::{transaction_tax, TaxBreakdown, TaxTerm, TaxTreatment};
use crate::time_value::{annuity_payment, BALANCE_EPSILON};
use crate::types::{with_metadata, AmortizationMethod, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    /// Rate per period (monthly for a loan quoted in months).
    pub periodic_rate: Rate,
    /// Number of periods.
    pub term: u32,
    #[serde(default)]
    pub method: AmortizationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_payment: Option<ExtraPaymentOverlay>,
    /// Transaction tax on the operation, computed with the term in months.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_tax: Option<TaxTreatment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub period: u32,
    /// Interest plus ordinary principal.
    pub installment: Money,
    pub interest: Money,
    pub principal: Money,
    pub extra_principal: Money,
    /// Outstanding balance after this period.
    pub balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub method: AmortizationMethod,
    /// Amount actually amortized (includes a financed transaction tax).
    pub financed_principal: Money,
    pub schedule: Vec<ScheduleRow>,
    pub first_installment: Money,
    pub last_installment: Money,
    pub total_interest: Money,
    /// Financed principal plus total interest.
    pub total_paid: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_tax: Option<TaxBreakdown>,
    /// Total paid plus any tax settled outside the loan.
    pub total_cost: Money,
    pub realized_term: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_amortization: Option<ExtraAmortizationSummary>,
}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// The installment rule in force, fixed once per schedule by the method and
/// re-derived only when a reduce-payment extra payment lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Installment {
    /// Level total installment (Price).
    Level(Money),
    /// Level ordinary principal (SAC).
    FixedPrincipal(Money),
}

impl Installment {
    /// Derive the rule that repays `balance` over `periods`. The flag is set
    /// when the annuity degenerates and a balloon of balance plus one period
    /// of interest is used instead.
    pub(crate) fn for_balance(
        method: AmortizationMethod,
        balance: Money,
        rate: Rate,
        periods: u32,
    ) -> (Self, bool) {
        match method {
            AmortizationMethod::ConstantPayment => match annuity_payment(balance, rate, periods) {
                Some(p) => (Installment::Level(p), false),
                None => (Installment::Level(balance + balance * rate), true),
            },
            AmortizationMethod::ConstantPrincipal => {
                if periods == 0 {
                    (Installment::FixedPrincipal(balance), true)
                } else {
                    (
                        Installment::FixedPrincipal(balance / Decimal::from(periods)),
                        false,
                    )
                }
            }
        }
    }

    fn method(&self) -> AmortizationMethod {
        match self {
            Installment::Level(_) => AmortizationMethod::ConstantPayment,
            Installment::FixedPrincipal(_) => AmortizationMethod::ConstantPrincipal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScheduleState {
    pub balance: Money,
    pub remaining_term: u32,
    pub installment: Installment,
}

impl ScheduleState {
    pub(crate) fn new(
        method: AmortizationMethod,
        principal: Money,
        rate: Rate,
        term: u32,
    ) -> (Self, bool) {
        let (installment, degenerate) = Installment::for_balance(method, principal, rate, term);
        (
            ScheduleState {
                balance: principal,
                remaining_term: term,
                installment,
            },
            degenerate,
        )
    }
}

pub(crate) struct Step {
    pub next: ScheduleState,
    pub row: ScheduleRow,
    /// The installment was re-derived and fell back to a balloon.
    pub balloon: bool,
}

/// Advance the recurrence by one period.
pub(crate) fn step(
    state: ScheduleState,
    period: u32,
    rate: Rate,
    overlay: Option<&ExtraPaymentOverlay>,
) -> Step {
    let balance = state.balance;
    let interest = balance * rate;

    let scheduled = match state.installment {
        Installment::Level(payment) => payment - interest,
        Installment::FixedPrincipal(amount) => amount,
    };
    let mut principal = if state.remaining_term <= 1 {
        // Final scheduled period settles whatever is left.
        balance
    } else {
        scheduled.max(Decimal::ZERO).min(balance)
    };

    let extra = overlay
        .map(|o| o.amount_for(period, balance - principal))
        .unwrap_or(Decimal::ZERO);

    let mut new_balance = balance - principal - extra;
    if new_balance <= BALANCE_EPSILON {
        principal += new_balance;
        new_balance = Decimal::ZERO;
    }

    let remaining_term = state.remaining_term.saturating_sub(1);
    let mut installment = state.installment;
    let mut balloon = false;

    let reprice = extra > Decimal::ZERO
        && !new_balance.is_zero()
        && overlay.is_some_and(|o| o.goal == ExtraGoal::ReducePayment);
    if reprice {
        let (next, degenerate) =
            Installment::for_balance(installment.method(), new_balance, rate, remaining_term);
        installment = next;
        balloon = degenerate;
    }

    Step {
        next: ScheduleState {
            balance: new_balance,
            remaining_term,
            installment,
        },
        row: ScheduleRow {
            period,
            installment: interest + principal,
            interest,
            principal,
            extra_principal: extra,
            balance: new_balance,
        },
        balloon,
    }
}

/// Rows and totals of one run of the recurrence.
pub(crate) struct Recurrence {
    pub rows: Vec<ScheduleRow>,
    pub total_interest: Money,
    pub total_extra: Money,
    pub balloon_periods: Vec<u32>,
}

/// Run the recurrence from `principal` for at most `term` periods, stopping
/// as soon as the balance reaches zero.
pub(crate) fn run_recurrence(
    method: AmortizationMethod,
    principal: Money,
    rate: Rate,
    term: u32,
    overlay: Option<&ExtraPaymentOverlay>,
) -> Recurrence {
    let (mut state, degenerate) = ScheduleState::new(method, principal, rate, term);
    let mut rows = Vec::with_capacity(term as usize);
    let mut total_interest = Decimal::ZERO;
    let mut total_extra = Decimal::ZERO;
    let mut balloon_periods = Vec::new();
    if degenerate {
        balloon_periods.push(1);
    }

    for period in 1..=term {
        let Step { next, row, balloon } = step(state, period, rate, overlay);
        total_interest += row.interest;
        total_extra += row.extra_principal;
        if balloon {
            balloon_periods.push(period + 1);
        }
        rows.push(row);
        state = next;
        if state.balance.is_zero() {
            break;
        }
    }

    Recurrence {
        rows,
        total_interest,
        total_extra,
        balloon_periods,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the amortization schedule for a loan, applying the extra-payment
/// overlay and transaction tax when present.
pub fn compute_schedule(
    input: &LoanInput,
) -> LoanSimResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_loan(input)?;

    let tax_days = TaxTerm::Months(input.term).taxable_days();
    let tax = input
        .transaction_tax
        .map(|t| (t, transaction_tax(input.principal, tax_days)));

    let financed_principal = match tax {
        Some((TaxTreatment::Financed, ref breakdown)) => input.principal + breakdown.total,
        _ => input.principal,
    };
    let separate_tax = match tax {
        Some((TaxTreatment::PaidSeparately, ref breakdown)) => breakdown.total,
        _ => Decimal::ZERO,
    };

    tracing::debug!(
        principal = %financed_principal,
        rate = %input.periodic_rate,
        term = input.term,
        method = ?input.method,
        extra = input.extra_payment.is_some(),
        "computing amortization schedule"
    );

    let actual = run_recurrence(
        input.method,
        financed_principal,
        input.periodic_rate,
        input.term,
        input.extra_payment.as_ref(),
    );

    for period in &actual.balloon_periods {
        tracing::warn!(period, "annuity degenerated, falling back to balloon payment");
        warnings.push(format!(
            "Installment from period {period} fell back to a balloon payment"
        ));
    }

    let realized_term = actual.rows.len() as u32;

    let extra_amortization = match input.extra_payment {
        Some(ref overlay) => {
            let baseline = run_recurrence(
                input.method,
                financed_principal,
                input.periodic_rate,
                input.term,
                None,
            );
            if actual.total_extra.is_zero() {
                warnings.push("Extra payment had no effect: the loan was already repaid".into());
            }
            Some(ExtraAmortizationSummary {
                total_extra_principal: actual.total_extra,
                interest_saved: baseline.total_interest - actual.total_interest,
                original_term: input.term,
                realized_term,
                periods_saved: input.term - realized_term,
                goal: overlay.goal,
            })
        }
        None => None,
    };

    let first_installment = actual
        .rows
        .first()
        .map(|r| r.installment)
        .unwrap_or(Decimal::ZERO);
    let last_installment = actual
        .rows
        .last()
        .map(|r| r.installment)
        .unwrap_or(Decimal::ZERO);
    let total_paid = financed_principal + actual.total_interest;

    let output = AmortizationOutput {
        method: input.method,
        financed_principal,
        first_installment,
        last_installment,
        total_interest: actual.total_interest,
        total_paid,
        transaction_tax: tax.map(|(_, breakdown)| breakdown),
        total_cost: total_paid + separate_tax,
        realized_term,
        extra_amortization,
        schedule: actual.rows,
    };

    tracing::debug!(
        realized_term,
        total_interest = %output.total_interest,
        "amortization schedule complete"
    );

    let methodology = match input.method {
        AmortizationMethod::ConstantPayment => "Price table (constant payment) amortization",
        AmortizationMethod::ConstantPrincipal => "SAC (constant principal) amortization",
    };
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, output))
}

fn validate_loan(input: &LoanInput) -> LoanSimResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(LoanSimError::invalid("principal", "Principal must be positive"));
    }
    if input.periodic_rate <= Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "periodic_rate",
            "Periodic rate must be positive",
        ));
    }
    if input.term == 0 {
        return Err(LoanSimError::invalid(
            "term",
            "Term must be greater than zero",
        ));
    }
    if let Some(ref overlay) = input.extra_payment {
        overlay.validate(input.term)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::extra_payments::ExtraFrequency;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.01);

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn price_loan() -> LoanInput {
        LoanInput {
            principal: dec!(100000),
            periodic_rate: dec!(0.01),
            term: 360,
            method: AmortizationMethod::ConstantPayment,
            extra_payment: None,
            transaction_tax: None,
        }
    }

    fn run(input: &LoanInput) -> AmortizationOutput {
        compute_schedule(input).unwrap().result
    }

    #[test]
    fn test_price_first_installment() {
        let out = run(&price_loan());
        assert_close(out.first_installment, dec!(1028.61), TOL, "first installment");
        assert_eq!(out.schedule.len(), 360);
        assert!(out.total_paid > dec!(100000));
        assert!(out.extra_amortization.is_none());
    }

    #[test]
    fn test_first_row_interest_is_balance_times_rate() {
        let out = run(&price_loan());
        assert_eq!(out.schedule[0].interest, dec!(1000));
        assert_eq!(out.schedule[0].period, 1);
    }

    #[test]
    fn test_step_applies_extra_and_reprices() {
        let rate = dec!(0.01);
        let (state, _) =
            ScheduleState::new(AmortizationMethod::ConstantPrincipal, dec!(1200), rate, 12);
        let overlay = ExtraPaymentOverlay {
            amount: dec!(100),
            start_period: 1,
            frequency: ExtraFrequency::OneTime,
            goal: ExtraGoal::ReducePayment,
        };
        let s = step(state, 1, rate, Some(&overlay));
        assert_eq!(s.row.principal, dec!(100));
        assert_eq!(s.row.extra_principal, dec!(100));
        assert_eq!(s.next.balance, dec!(1000));
        assert_eq!(s.next.remaining_term, 11);
        assert_eq!(
            s.next.installment,
            Installment::FixedPrincipal(dec!(1000) / dec!(11))
        );
        assert!(!s.balloon);
    }

    #[test]
    fn test_step_shorten_term_keeps_installment() {
        let rate = dec!(0.01);
        let (state, _) =
            ScheduleState::new(AmortizationMethod::ConstantPayment, dec!(1000), rate, 10);
        let overlay = ExtraPaymentOverlay {
            amount: dec!(50),
            start_period: 1,
            frequency: ExtraFrequency::OneTime,
            goal: ExtraGoal::ShortenTerm,
        };
        let s = step(state, 1, rate, Some(&overlay));
        assert_eq!(s.next.installment, state.installment);
    }

    #[test]
    fn test_extra_clipped_to_remaining_balance() {
        let mut input = price_loan();
        input.principal = dec!(1000);
        input.term = 12;
        input.extra_payment = Some(ExtraPaymentOverlay {
            amount: dec!(5000),
            start_period: 2,
            frequency: ExtraFrequency::OneTime,
            goal: ExtraGoal::ShortenTerm,
        });
        let out = run(&input);
        assert_eq!(out.realized_term, 2);
        let row = &out.schedule[1];
        assert!(row.principal + row.extra_principal <= out.schedule[0].balance);
        assert_eq!(row.balance, Decimal::ZERO);
    }

    #[test]
    fn test_reduce_payment_lowers_later_installments() {
        let mut input = price_loan();
        input.term = 120;
        input.extra_payment = Some(ExtraPaymentOverlay {
            amount: dec!(20000),
            start_period: 12,
            frequency: ExtraFrequency::OneTime,
            goal: ExtraGoal::ReducePayment,
        });
        let out = run(&input);
        assert_eq!(out.realized_term, 120);
        assert!(out.schedule[12].installment < out.schedule[10].installment);
        let summary = out.extra_amortization.unwrap();
        assert_eq!(summary.periods_saved, 0);
        assert!(summary.interest_saved > Decimal::ZERO);
    }

    #[test]
    fn test_financed_tax_raises_principal() {
        let mut input = price_loan();
        input.transaction_tax = Some(TaxTreatment::Financed);
        let out = run(&input);
        assert_eq!(out.financed_principal, dec!(103373));
        assert_eq!(out.total_cost, out.total_paid);
    }

    #[test]
    fn test_separate_tax_added_to_cost() {
        let mut input = price_loan();
        input.transaction_tax = Some(TaxTreatment::PaidSeparately);
        let out = run(&input);
        assert_eq!(out.financed_principal, dec!(100000));
        assert_eq!(out.total_cost, out.total_paid + dec!(3373));
    }

    #[test]
    fn test_validation_rejects_bad_inputs() {
        let mut input = price_loan();
        input.principal = Decimal::ZERO;
        assert!(matches!(
            compute_schedule(&input),
            Err(LoanSimError::InvalidInput { ref field, .. }) if field == "principal"
        ));

        let mut input = price_loan();
        input.periodic_rate = Decimal::ZERO;
        assert!(compute_schedule(&input).is_err());

        let mut input = price_loan();
        input.term = 0;
        assert!(compute_schedule(&input).is_err());

        let mut input = price_loan();
        input.extra_payment = Some(ExtraPaymentOverlay {
            amount: dec!(100),
            start_period: 361,
            frequency: ExtraFrequency::OneTime,
            goal: ExtraGoal::ShortenTerm,
        });
        assert!(compute_schedule(&input).is_err());
    }

    #[test]
    fn test_vanishing_rate_falls_back_to_balloon() {
        let rate = dec!(0.00000000000001);
        let mut input = price_loan();
        input.principal = dec!(1000);
        input.periodic_rate = rate;
        input.term = 12;

        let full = compute_schedule(&input).unwrap();
        let out = &full.result;
        assert_eq!(out.schedule.len(), 1);
        assert_eq!(out.schedule[0].installment, dec!(1000) * (Decimal::ONE + rate));
        assert_eq!(out.schedule[0].balance, Decimal::ZERO);
        assert_eq!(out.realized_term, 1);
        assert_eq!(full.warnings.len(), 1);
        assert!(full.warnings[0].contains("fell back to a balloon payment"));
    }

    #[test]
    fn test_reprice_at_vanishing_rate_falls_back_to_balloon() {
        let rate = dec!(0.00000000000001);
        let state = ScheduleState {
            balance: dec!(1000),
            remaining_term: 12,
            installment: Installment::Level(dec!(100)),
        };
        let overlay = ExtraPaymentOverlay {
            amount: dec!(100),
            start_period: 1,
            frequency: ExtraFrequency::OneTime,
            goal: ExtraGoal::ReducePayment,
        };
        let s = step(state, 1, rate, Some(&overlay));
        let balance = s.next.balance;
        assert_eq!(balance, dec!(800) + dec!(1000) * rate);
        assert!(s.balloon);
        assert_eq!(s.next.remaining_term, 11);
        assert_eq!(
            s.next.installment,
            Installment::Level(balance + balance * rate)
        );
    }

    #[test]
    fn test_single_period_loan() {
        let mut input = price_loan();
        input.principal = dec!(1000);
        input.term = 1;
        let out = run(&input);
        assert_eq!(out.schedule.len(), 1);
        assert_close(out.first_installment, dec!(1010), TOL, "single period installment");
        assert_eq!(out.schedule[0].balance, Decimal::ZERO);
    }
}
