//! Annuity and rate-conversion primitives shared by every engine.
//!
//! Powers are taken by repeated multiplication of the discount factor
//! `1 / (1 + r)` so long terms at high rates shrink toward zero instead of
//! overflowing the 96-bit Decimal mantissa.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::LoanSimError;
use crate::types::{Money, Rate};
use crate::LoanSimResult;

/// Balance at or below which a loan is considered fully repaid.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

/// Annuity denominators below this are treated as zero.
const DEGENERATE_THRESHOLD: Decimal = dec!(0.000000000001);

/// Compute base^n for a non-negative integer exponent via iterative multiplication.
pub fn iterative_pow(base: Decimal, n: u32) -> Decimal {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result *= base;
    }
    result
}

/// `base^n` by repeated multiplication, or `None` once the result leaves the
/// Decimal range.
pub fn checked_pow(base: Decimal, n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

/// Present-value factor `(1 + r)^-n`.
pub fn discount_factor(rate: Rate, n: u32) -> Decimal {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    iterative_pow(Decimal::ONE / one_plus_r, n)
}

/// Level installment that repays `balance` over `periods` at `rate`:
/// `B * r / (1 - (1 + r)^-n)`.
///
/// Returns `None` when the formula degenerates (no periods left, or a
/// denominator indistinguishable from zero). Callers fall back to a balloon.
pub fn annuity_payment(balance: Money, rate: Rate, periods: u32) -> Option<Money> {
    if periods == 0 {
        return None;
    }
    if rate.is_zero() {
        return Some(balance / Decimal::from(periods));
    }
    let denom = Decimal::ONE - discount_factor(rate, periods);
    if denom.abs() < DEGENERATE_THRESHOLD {
        return None;
    }
    Some(balance * rate / denom)
}

/// Principal that a level `payment` over `periods` amortizes at `rate`.
/// At a zero rate this is the straight-line limit `payment * n`.
pub fn annuity_present_value(payment: Money, rate: Rate, periods: u32) -> Money {
    if rate.is_zero() {
        return payment * Decimal::from(periods);
    }
    payment * (Decimal::ONE - discount_factor(rate, periods)) / rate
}

/// Compute the nth root of x using Newton's method (40 iterations).
///
/// Returns `None` when an intermediate power overflows, which only happens
/// for roots of very large numbers.
pub fn nth_root(x: Decimal, n: u32) -> Option<Decimal> {
    if x == Decimal::ONE || x.is_zero() || n == 1 {
        return Some(x);
    }
    if n == 0 {
        return Some(Decimal::ONE);
    }

    let n_dec = Decimal::from(n);
    let mut guess = Decimal::ONE;

    for _ in 0..40 {
        let g_n_minus_1 = checked_pow(guess, n - 1)?;
        if g_n_minus_1.is_zero() {
            break;
        }
        let delta = (g_n_minus_1.checked_mul(guess)? - x) / n_dec.checked_mul(g_n_minus_1)?;
        guess -= delta;
        if delta.abs() < dec!(0.0000000000001) {
            break;
        }
    }

    Some(guess)
}

/// Equivalent compound rate for one of `periods_per_year` sub-periods:
/// `(1 + annual)^(1/k) - 1`.
pub fn periodic_rate_from_annual(annual_rate: Rate, periods_per_year: u32) -> LoanSimResult<Rate> {
    if periods_per_year == 0 {
        return Err(LoanSimError::DivisionByZero {
            context: "periods per year".into(),
        });
    }
    if annual_rate <= dec!(-1) {
        return Err(LoanSimError::invalid(
            "annual_rate",
            "Annual rate must be greater than -100%",
        ));
    }
    let root = nth_root(Decimal::ONE + annual_rate, periods_per_year).ok_or_else(|| {
        LoanSimError::invalid(
            "annual_rate",
            format!(
                "Annual rate {annual_rate} is too large to convert to {periods_per_year} periods"
            ),
        )
    })?;
    Ok(root - Decimal::ONE)
}

/// Effective annual rate for a periodic rate compounded `periods_per_year`
/// times, or `None` when `(1 + r)^k` is not representable.
pub fn annualize(periodic_rate: Rate, periods_per_year: u32) -> Option<Rate> {
    checked_pow(Decimal::ONE + periodic_rate, periods_per_year).map(|f| f - Decimal::ONE)
}
