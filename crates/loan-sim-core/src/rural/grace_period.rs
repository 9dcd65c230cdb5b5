//! Rural financing with a grace period followed by annual amortization.
//!
//! During the grace period no principal is repaid. Interest is either paid in
//! sub-annual installments, accrued and settled in one payment when the grace
//! period ends, or capitalized into the balance. The remaining years are
//! amortized annually with the same Price/SAC recurrence as ordinary loans.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::schedule::run_recurrence;
use crate::error::LoanSimError;
use crate::time_value::periodic_rate_from_annual;
use crate::types::{with_metadata, AmortizationMethod, ComputationOutput, Money, Rate};
use crate::LoanSimResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// What happens to interest during the grace period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraceTreatment {
    #[default]
    PayPeriodically,
    PayAtEnd,
    Capitalize,
}

/// Installments per year for grace-period interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraceFrequency {
    #[default]
    Annual,
    Semiannual,
    Quarterly,
    Monthly,
}

impl GraceFrequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            GraceFrequency::Annual => 1,
            GraceFrequency::Semiannual => 2,
            GraceFrequency::Quarterly => 4,
            GraceFrequency::Monthly => 12,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            GraceFrequency::Annual => "Year",
            GraceFrequency::Semiannual => "Semester",
            GraceFrequency::Quarterly => "Quarter",
            GraceFrequency::Monthly => "Month",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuralInput {
    pub principal: Money,
    pub annual_rate: Rate,
    pub total_years: u32,
    #[serde(default)]
    pub grace_years: u32,
    #[serde(default)]
    pub method: AmortizationMethod,
    #[serde(default)]
    pub grace_treatment: GraceTreatment,
    /// Only used with `PayPeriodically`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_frequency: Option<GraceFrequency>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuralPhase {
    Grace,
    /// Single payment of interest accrued over the grace period.
    GraceSettlement,
    Amortization,
    /// Principal returned at the end of a term with no amortization years.
    Repayment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuralRow {
    /// Sequential 1-based row number.
    pub period: u32,
    pub label: String,
    pub phase: RuralPhase,
    pub installment: Money,
    pub interest: Money,
    pub principal: Money,
    pub balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuralOutput {
    pub method: AmortizationMethod,
    pub grace_treatment: GraceTreatment,
    pub amortization_years: u32,
    /// Rate applied to each grace row.
    pub grace_period_rate: Rate,
    pub schedule: Vec<RuralRow>,
    pub grace_interest: Money,
    pub balance_after_grace: Money,
    pub total_interest: Money,
    /// Principal plus total interest.
    pub total_paid: Money,
    /// First amortization row that repays principal.
    pub first_installment: Option<Money>,
    /// Final amortization row.
    pub last_installment: Option<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the schedule of a rural financing with a grace period.
pub fn compute_rural_schedule(
    input: &RuralInput,
) -> LoanSimResult<ComputationOutput<RuralOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate_rural(input)?;

    if input.grace_frequency.is_some() && input.grace_treatment != GraceTreatment::PayPeriodically
    {
        warnings.push("grace_frequency is ignored unless interest is paid periodically".into());
    }

    let amortization_years = input.total_years - input.grace_years;
    tracing::debug!(
        principal = %input.principal,
        annual_rate = %input.annual_rate,
        grace_years = input.grace_years,
        amortization_years,
        treatment = ?input.grace_treatment,
        "computing rural schedule"
    );

    let grace = grace_phase(input)?;
    let mut schedule = grace.rows;
    let balance = grace.balance;

    // Installments stay below balance * (1 + r) and interest below
    // balance * r per year, so this bounds every figure that follows.
    let bound = balance
        .checked_mul(Decimal::ONE + input.annual_rate)
        .and_then(|v| v.checked_mul(Decimal::from(input.total_years)));
    if bound.is_none() {
        return Err(out_of_range());
    }

    let mut first_installment = None;
    let mut last_installment = None;
    let mut amortization_interest = Decimal::ZERO;

    if amortization_years > 0 {
        let phase = run_recurrence(
            input.method,
            balance,
            input.annual_rate,
            amortization_years,
            None,
        );
        for year in &phase.balloon_periods {
            warnings.push(format!(
                "Amortization year {year} fell back to a balloon payment"
            ));
        }
        amortization_interest = phase.total_interest;
        first_installment = phase
            .rows
            .iter()
            .find(|r| !r.principal.is_zero())
            .map(|r| r.installment);
        last_installment = phase.rows.last().map(|r| r.installment);

        let offset = schedule.len() as u32;
        schedule.extend(phase.rows.into_iter().map(|r| RuralRow {
            period: offset + r.period,
            label: format!("Year {}", input.grace_years + r.period),
            phase: RuralPhase::Amortization,
            installment: r.installment,
            interest: r.interest,
            principal: r.principal,
            balance: r.balance,
        }));
    } else if !balance.is_zero() {
        warnings.push(
            "No amortization years: principal is repaid in one payment at the end of the term"
                .into(),
        );
        schedule.push(RuralRow {
            period: schedule.len() as u32 + 1,
            label: format!("Year {}", input.total_years),
            phase: RuralPhase::Repayment,
            installment: balance,
            interest: Decimal::ZERO,
            principal: balance,
            balance: Decimal::ZERO,
        });
    }

    let total_interest = grace.interest + amortization_interest;
    let output = RuralOutput {
        method: input.method,
        grace_treatment: input.grace_treatment,
        amortization_years,
        grace_period_rate: grace.rate,
        schedule,
        grace_interest: grace.interest,
        balance_after_grace: balance,
        total_interest,
        total_paid: input.principal + total_interest,
        first_installment,
        last_installment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rural financing: grace period followed by annual amortization",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Grace phase
// ---------------------------------------------------------------------------

struct GracePhase {
    rows: Vec<RuralRow>,
    interest: Money,
    balance: Money,
    rate: Rate,
}

fn grace_phase(input: &RuralInput) -> LoanSimResult<GracePhase> {
    let mut rows = Vec::new();
    let mut balance = input.principal;
    let mut interest_total = Decimal::ZERO;

    if input.grace_years == 0 {
        return Ok(GracePhase {
            rows,
            interest: interest_total,
            balance,
            rate: Decimal::ZERO,
        });
    }

    let rate = match input.grace_treatment {
        GraceTreatment::PayPeriodically => {
            let frequency = input.grace_frequency.unwrap_or_default();
            let per_year = frequency.periods_per_year();
            let sub_rate = periodic_rate_from_annual(input.annual_rate, per_year)?;
            let interest = balance * sub_rate;
            for n in 1..=input.grace_years * per_year {
                interest_total += interest;
                rows.push(RuralRow {
                    period: n,
                    label: format!("{} {}", frequency.label(), n),
                    phase: RuralPhase::Grace,
                    installment: interest,
                    interest,
                    principal: Decimal::ZERO,
                    balance,
                });
            }
            sub_rate
        }
        GraceTreatment::Capitalize => {
            for year in 1..=input.grace_years {
                let interest = balance
                    .checked_mul(input.annual_rate)
                    .ok_or_else(out_of_range)?;
                balance = balance.checked_add(interest).ok_or_else(out_of_range)?;
                interest_total += interest;
                rows.push(RuralRow {
                    period: year,
                    label: format!("Year {year}"),
                    phase: RuralPhase::Grace,
                    installment: Decimal::ZERO,
                    interest,
                    principal: Decimal::ZERO,
                    balance,
                });
            }
            input.annual_rate
        }
        GraceTreatment::PayAtEnd => {
            let interest = balance * input.annual_rate;
            for year in 1..=input.grace_years {
                interest_total += interest;
                rows.push(RuralRow {
                    period: year,
                    label: format!("Year {year}"),
                    phase: RuralPhase::Grace,
                    installment: Decimal::ZERO,
                    interest,
                    principal: Decimal::ZERO,
                    balance,
                });
            }
            rows.push(RuralRow {
                period: input.grace_years + 1,
                label: format!("Year {} (grace interest)", input.grace_years),
                phase: RuralPhase::GraceSettlement,
                installment: interest_total,
                interest: Decimal::ZERO,
                principal: Decimal::ZERO,
                balance,
            });
            input.annual_rate
        }
    };

    Ok(GracePhase {
        rows,
        interest: interest_total,
        balance,
        rate,
    })
}

fn out_of_range() -> LoanSimError {
    LoanSimError::invalid(
        "annual_rate",
        "Rate and term produce amounts outside the representable range",
    )
}

fn validate_rural(input: &RuralInput) -> LoanSimResult<()> {
    if input.principal <= Decimal::ZERO {
        return Err(LoanSimError::invalid("principal", "Principal must be positive"));
    }
    if input.annual_rate <= Decimal::ZERO {
        return Err(LoanSimError::invalid(
            "annual_rate",
            "Annual rate must be positive",
        ));
    }
    if input.total_years == 0 {
        return Err(LoanSimError::invalid(
            "total_years",
            "Total term must be at least one year",
        ));
    }
    if input.grace_years > input.total_years {
        return Err(LoanSimError::invalid(
            "grace_years",
            "Grace period cannot exceed the total term",
        ));
    }
    Ok(())
}
