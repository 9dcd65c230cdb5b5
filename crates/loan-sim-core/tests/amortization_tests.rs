use loan_sim_core::amortization::extra_payments::{
    ExtraFrequency, ExtraGoal, ExtraPaymentOverlay,
};
use loan_sim_core::amortization::schedule::{compute_schedule, AmortizationOutput, LoanInput};
use loan_sim_core::{AmortizationMethod, LoanSimError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOL: Decimal = dec!(0.01);

fn loan(method: AmortizationMethod) -> LoanInput {
    LoanInput {
        principal: dec!(100000),
        periodic_rate: dec!(0.01),
        term: 360,
        method,
        extra_payment: None,
        transaction_tax: None,
    }
}

fn with_extra(method: AmortizationMethod, frequency: ExtraFrequency, goal: ExtraGoal) -> LoanInput {
    let mut input = loan(method);
    input.extra_payment = Some(ExtraPaymentOverlay {
        amount: dec!(300),
        start_period: 6,
        frequency,
        goal,
    });
    input
}

fn run(input: &LoanInput) -> AmortizationOutput {
    compute_schedule(input).unwrap().result
}

fn all_overlays() -> Vec<LoanInput> {
    let mut inputs = Vec::new();
    for method in [
        AmortizationMethod::ConstantPayment,
        AmortizationMethod::ConstantPrincipal,
    ] {
        for frequency in [ExtraFrequency::OneTime, ExtraFrequency::EveryPeriod] {
            for goal in [ExtraGoal::ShortenTerm, ExtraGoal::ReducePayment] {
                inputs.push(with_extra(method, frequency, goal));
            }
        }
    }
    inputs
}

// ===========================================================================
// Schedule invariants
// ===========================================================================

#[test]
fn test_principal_is_conserved() {
    let mut inputs = all_overlays();
    inputs.push(loan(AmortizationMethod::ConstantPayment));
    inputs.push(loan(AmortizationMethod::ConstantPrincipal));

    for input in &inputs {
        let out = run(input);
        let repaid: Decimal = out
            .schedule
            .iter()
            .map(|r| r.principal + r.extra_principal)
            .sum();
        assert!(
            (repaid - input.principal).abs() <= TOL,
            "repaid {} of {} ({:?})",
            repaid,
            input.principal,
            input.extra_payment
        );
        assert!((out.total_paid - (input.principal + out.total_interest)).abs() <= TOL);
    }
}

#[test]
fn test_balance_non_increasing_and_ends_at_zero() {
    for input in all_overlays() {
        let out = run(&input);
        let mut prior = input.principal;
        for (i, row) in out.schedule.iter().enumerate() {
            assert_eq!(row.period, i as u32 + 1, "periods must be sequential");
            assert!(row.balance <= prior, "balance rose at period {}", row.period);
            assert!(row.principal + row.extra_principal <= prior);
            assert_eq!(row.interest, prior * input.periodic_rate);
            prior = row.balance;
        }
        assert_eq!(out.schedule.last().unwrap().balance, Decimal::ZERO);
        assert_eq!(out.realized_term as usize, out.schedule.len());
    }
}

#[test]
fn test_price_installments_are_level() {
    let out = run(&loan(AmortizationMethod::ConstantPayment));
    let first = out.schedule[0].installment;
    for row in &out.schedule {
        assert!(
            (row.installment - first).abs() <= TOL,
            "period {} installment {} differs from {}",
            row.period,
            row.installment,
            first
        );
    }
}

#[test]
fn test_sac_principal_level_and_installment_decreasing() {
    let out = run(&loan(AmortizationMethod::ConstantPrincipal));
    let amortization = dec!(100000) / dec!(360);
    for row in &out.schedule {
        assert!((row.principal - amortization).abs() <= TOL);
    }
    for pair in out.schedule.windows(2) {
        assert!(pair[1].installment < pair[0].installment);
    }
    assert_eq!(out.first_installment, amortization + dec!(1000));
}

#[test]
fn test_extra_payments_never_increase_interest() {
    for input in all_overlays() {
        let out = run(&input);
        let baseline = run(&loan(input.method));
        assert!(out.total_interest <= baseline.total_interest);
        let summary = out.extra_amortization.unwrap();
        assert_eq!(
            summary.interest_saved,
            baseline.total_interest - out.total_interest
        );
        assert!(summary.total_extra_principal > Decimal::ZERO);
    }
}

// ===========================================================================
// Reference values
// ===========================================================================

#[test]
fn test_reference_price_loan() {
    let out = run(&loan(AmortizationMethod::ConstantPayment));
    assert!((out.first_installment - dec!(1028.61)).abs() <= TOL);
    assert!(out.total_paid > dec!(100000));
    assert_eq!(out.schedule.len(), 360);
}

#[test]
fn test_recurring_shorten_term_finishes_early() {
    let out = run(&with_extra(
        AmortizationMethod::ConstantPayment,
        ExtraFrequency::EveryPeriod,
        ExtraGoal::ShortenTerm,
    ));
    let summary = out.extra_amortization.unwrap();
    assert!(out.realized_term < 360);
    assert_eq!(summary.original_term, 360);
    assert_eq!(summary.periods_saved, 360 - out.realized_term);
    // Installment stays level until the final period.
    let first = out.schedule[0].installment;
    let penultimate = &out.schedule[out.schedule.len() - 2];
    assert!((penultimate.installment - first).abs() <= TOL);
}

#[test]
fn test_one_time_extra_only_in_start_period() {
    let out = run(&with_extra(
        AmortizationMethod::ConstantPrincipal,
        ExtraFrequency::OneTime,
        ExtraGoal::ShortenTerm,
    ));
    let with_extra: Vec<u32> = out
        .schedule
        .iter()
        .filter(|r| !r.extra_principal.is_zero())
        .map(|r| r.period)
        .collect();
    assert_eq!(with_extra, vec![6]);
}

#[test]
fn test_reduce_payment_keeps_term() {
    let out = run(&with_extra(
        AmortizationMethod::ConstantPrincipal,
        ExtraFrequency::OneTime,
        ExtraGoal::ReducePayment,
    ));
    assert_eq!(out.realized_term, 360);
    // Principal share drops after the extra payment: 300 spread over 354 periods.
    let before = out.schedule[4].principal;
    let after = out.schedule[6].principal;
    assert!(after < before);
}

#[test]
fn test_invalid_input_produces_no_schedule() {
    let mut input = loan(AmortizationMethod::ConstantPayment);
    input.principal = dec!(-5);
    let err = compute_schedule(&input).unwrap_err();
    assert!(matches!(err, LoanSimError::InvalidInput { .. }));
}
