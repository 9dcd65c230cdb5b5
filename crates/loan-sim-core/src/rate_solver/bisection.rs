//! Implied periodic rate of a level-payment loan.
//!
//! Inverts `PV = PMT * (1 - (1 + r)^-n) / r` for `r` by bisection on
//! `[0, 1]`. The implied principal falls monotonically as the rate rises, so
//! an implied principal above the target means the true rate is higher.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanSimError;
use crate::time_value::{annualize, annuity_present_value};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

const TOLERANCE: Decimal = dec!(0.0000001);
const MAX_ITERATIONS: u32 = 100;
const RATE_UPPER_BOUND: Rate = Decimal::ONE;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSolverInput {
    pub principal: Money,
    pub payment: Money,
    pub term: u32,
    /// Periods per year used to annualize the solved rate (default 12).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods_per_year: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSolverOutput {
    pub periodic_rate: Rate,
    /// `(1 + r)^k - 1`; `None` when the compounded factor overflows.
    pub annual_effective_rate: Option<Rate>,
    pub total_paid: Money,
    pub total_interest: Money,
    pub iterations: u32,
    /// Implied principal at the solved rate minus the target principal.
    pub residual: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Find the periodic rate at which `payment` over `term` periods repays `principal`.
pub fn solve_rate(
    input: &RateSolverInput,
) -> LoanSimResult<ComputationOutput<RateSolverOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_solver(input)?;

    let periods_per_year = input.periods_per_year.unwrap_or(12);
    if periods_per_year == 0 {
        return Err(LoanSimError::invalid(
            "periods_per_year",
            "Periods per year must be greater than zero",
        ));
    }

    let total_paid = input.payment * Decimal::from(input.term);
    if total_paid <= input.principal {
        return Err(LoanSimError::NoSolution(format!(
            "Payment {} over {} periods does not exceed the principal {}",
            input.payment, input.term, input.principal
        )));
    }

    // Above the upper bound the payment implies a rate outside the search domain.
    if annuity_present_value(input.payment, RATE_UPPER_BOUND, input.term) > input.principal {
        return Err(LoanSimError::NoSolution(format!(
            "Implied rate exceeds {}% per period",
            RATE_UPPER_BOUND * dec!(100)
        )));
    }

    let (rate, iterations, residual) = bisect(input.principal, input.payment, input.term);
    tracing::debug!(%rate, iterations, %residual, "rate solver finished");

    if rate <= Decimal::ZERO {
        return Err(LoanSimError::NoSolution(
            "Bisection resolved to a non-positive rate".into(),
        ));
    }
    if iterations == MAX_ITERATIONS && residual.abs() >= TOLERANCE {
        warnings.push(format!(
            "Stopped after {MAX_ITERATIONS} iterations with residual {residual}"
        ));
    }

    let annual_effective_rate = annualize(rate, periods_per_year);
    if annual_effective_rate.is_none() {
        tracing::warn!(%rate, periods_per_year, "annual effective rate out of range");
        warnings.push(format!(
            "Annual effective rate of {rate} compounded {periods_per_year} times is out of range"
        ));
    }

    let output = RateSolverOutput {
        periodic_rate: rate,
        annual_effective_rate,
        total_paid,
        total_interest: total_paid - input.principal,
        iterations,
        residual,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bisection on the annuity present-value equation",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Returns the midpoint rate, the iterations used and the final residual.
fn bisect(principal: Money, payment: Money, term: u32) -> (Rate, u32, Money) {
    let mut lo = Decimal::ZERO;
    let mut hi = RATE_UPPER_BOUND;
    let mut mid = Decimal::ZERO;
    let mut residual = Decimal::ZERO;

    for i in 1..=MAX_ITERATIONS {
        mid = (lo + hi) / dec!(2);
        residual = annuity_present_value(payment, mid, term) - principal;

        if residual.abs() < TOLERANCE {
            return (mid, i, residual);
        }
        if residual > Decimal::ZERO {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < TOLERANCE {
            let rate = (lo + hi) / dec!(2);
            return (rate, i, annuity_present_value(payment, rate, term) - principal);
        }
    }

    (mid, MAX_ITERATIONS, residual)
}

fn validate_solver(input: &RateSolverInput) -> LoanSimResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(LoanSimError::invalid("principal", "Principal must be positive"));
    }
    if input.payment <= Decimal::ZERO {
        return Err(LoanSimError::invalid("payment", "Payment must be positive"));
    }
    if input.term == 0 {
        return Err(LoanSimError::invalid(
            "term",
            "Term must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::annuity_payment;

    fn input(principal: Money, payment: Money, term: u32) -> RateSolverInput {
        RateSolverInput {
            principal,
            payment,
            term,
            periods_per_year: None,
        }
    }

    #[test]
    fn test_recovers_reference_rate() {
        let out = solve_rate(&input(dec!(100000), dec!(1028.61), 360))
            .unwrap()
            .result;
        assert!((out.periodic_rate - dec!(0.01)).abs() < dec!(0.0001));
        assert!(out.iterations <= MAX_ITERATIONS);
    }

    #[test]
    fn test_round_trip_short_term() {
        let pmt = annuity_payment(dec!(25000), dec!(0.025), 24).unwrap();
        let out = solve_rate(&input(dec!(25000), pmt, 24)).unwrap().result;
        assert!((out.periodic_rate - dec!(0.025)).abs() < dec!(0.0001));
        assert_eq!(out.total_interest, pmt * dec!(24) - dec!(25000));
    }

    #[test]
    fn test_insufficient_payment_has_no_solution() {
        let err = solve_rate(&input(dec!(10000), dec!(27), 360)).unwrap_err();
        assert!(matches!(err, LoanSimError::NoSolution(_)));
    }

    #[test]
    fn test_straight_line_payment_has_no_solution() {
        // Exactly principal / term: zero interest is not a positive rate.
        let err = solve_rate(&input(dec!(1200), dec!(100), 12)).unwrap_err();
        assert!(matches!(err, LoanSimError::NoSolution(_)));
    }

    #[test]
    fn test_rate_above_search_domain_has_no_solution() {
        let err = solve_rate(&input(dec!(1000), dec!(5000), 12)).unwrap_err();
        assert!(matches!(err, LoanSimError::NoSolution(_)));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            solve_rate(&input(Decimal::ZERO, dec!(10), 12)),
            Err(LoanSimError::InvalidInput { .. })
        ));
        assert!(matches!(
            solve_rate(&input(dec!(100), Decimal::ZERO, 12)),
            Err(LoanSimError::InvalidInput { .. })
        ));
        assert!(matches!(
            solve_rate(&input(dec!(100), dec!(10), 0)),
            Err(LoanSimError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_annual_effective_rate() {
        let pmt = annuity_payment(dec!(10000), dec!(0.01), 12).unwrap();
        let out = solve_rate(&input(dec!(10000), pmt, 12)).unwrap().result;
        // 1.01^12 - 1 ~ 12.68%
        let annual = out.annual_effective_rate.unwrap();
        assert!((annual - dec!(0.126825)).abs() < dec!(0.0005));
    }

    #[test]
    fn test_daily_rate_with_unrepresentable_annual_rate() {
        let full = solve_rate(&RateSolverInput {
            principal: dec!(1000),
            payment: dec!(300),
            term: 365,
            periods_per_year: Some(365),
        })
        .unwrap();
        let out = &full.result;
        // Close to the perpetuity rate 300 / 1000.
        assert!((out.periodic_rate - dec!(0.3)).abs() < dec!(0.0001));
        assert!(out.annual_effective_rate.is_none());
        assert_eq!(full.warnings.len(), 1);
        assert!(full.warnings[0].contains("out of range"));
    }

    #[test]
    fn test_residual_matches_reported_rate() {
        let pmt = annuity_payment(dec!(80000), dec!(0.0125), 180).unwrap();
        let out = solve_rate(&input(dec!(80000), pmt, 180)).unwrap().result;
        let at_rate = annuity_present_value(pmt, out.periodic_rate, 180) - dec!(80000);
        assert_eq!(out.residual, at_rate);
    }
}
