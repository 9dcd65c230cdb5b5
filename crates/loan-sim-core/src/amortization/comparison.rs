use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::schedule::{compute_schedule, LoanInput};
use crate::types::{with_metadata, AmortizationMethod, ComputationOutput, Money};
use crate::{LoanSimError, LoanSimResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScenario {
    pub name: String,
    pub loan: LoanInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub scenarios: Vec<LoanScenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub method: AmortizationMethod,
    pub first_installment: Money,
    pub last_installment: Money,
    pub total_interest: Money,
    pub total_cost: Money,
    pub realized_term: u32,
    /// 1 = cheapest by total cost.
    pub rank: u32,
    /// Extra cost over the cheapest scenario.
    pub cost_over_cheapest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    /// Scenarios in input order.
    pub scenarios: Vec<ScenarioSummary>,
    pub cheapest: String,
    pub most_expensive: String,
    /// Total cost of the most expensive minus the cheapest scenario.
    pub cost_spread: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run several loan simulations side by side and rank them by total cost.
pub fn compare_scenarios(
    input: &ComparisonInput,
) -> LoanSimResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.scenarios.len() < 2 {
        return Err(LoanSimError::InsufficientData(
            "Comparison requires at least 2 scenarios".into(),
        ));
    }

    let mut summaries = Vec::with_capacity(input.scenarios.len());
    for scenario in &input.scenarios {
        let out = compute_schedule(&scenario.loan).map_err(|e| match e {
            LoanSimError::InvalidInput { field, reason } => LoanSimError::InvalidInput {
                field: format!("{}.{}", scenario.name, field),
                reason,
            },
            other => other,
        })?;
        warnings.extend(
            out.warnings
                .into_iter()
                .map(|w| format!("{}: {}", scenario.name, w)),
        );
        let r = out.result;
        summaries.push(ScenarioSummary {
            name: scenario.name.clone(),
            method: r.method,
            first_installment: r.first_installment,
            last_installment: r.last_installment,
            total_interest: r.total_interest,
            total_cost: r.total_cost,
            realized_term: r.realized_term,
            rank: 0,
            cost_over_cheapest: Decimal::ZERO,
        });
    }

    // Stable sort keeps input order among equal costs.
    let mut order: Vec<usize> = (0..summaries.len()).collect();
    order.sort_by(|&a, &b| summaries[a].total_cost.cmp(&summaries[b].total_cost));

    let cheapest_idx = order[0];
    let most_expensive_idx = order[order.len() - 1];
    let cheapest_cost = summaries[cheapest_idx].total_cost;

    for (rank, &idx) in order.iter().enumerate() {
        summaries[idx].rank = rank as u32 + 1;
        summaries[idx].cost_over_cheapest = summaries[idx].total_cost - cheapest_cost;
    }

    let output = ComparisonOutput {
        cheapest: summaries[cheapest_idx].name.clone(),
        most_expensive: summaries[most_expensive_idx].name.clone(),
        cost_spread: summaries[most_expensive_idx].total_cost - cheapest_cost,
        scenarios: summaries,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Side-by-side amortization comparison ranked by total cost",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scenario(name: &str, method: AmortizationMethod) -> LoanScenario {
        LoanScenario {
            name: name.into(),
            loan: LoanInput {
                principal: dec!(200000),
                periodic_rate: dec!(0.008),
                term: 240,
                method,
                extra_payment: None,
                transaction_tax: None,
            },
        }
    }

    #[test]
    fn test_sac_cheaper_than_price() {
        let input = ComparisonInput {
            scenarios: vec![
                scenario("price", AmortizationMethod::ConstantPayment),
                scenario("sac", AmortizationMethod::ConstantPrincipal),
            ],
        };
        let out = compare_scenarios(&input).unwrap().result;
        assert_eq!(out.cheapest, "sac");
        assert_eq!(out.most_expensive, "price");
        assert_eq!(out.scenarios[1].rank, 1);
        assert_eq!(out.scenarios[0].rank, 2);
        assert_eq!(out.scenarios[1].cost_over_cheapest, Decimal::ZERO);
        assert!(out.cost_spread > Decimal::ZERO);
        // SAC starts higher than Price.
        assert!(out.scenarios[1].first_installment > out.scenarios[0].first_installment);
    }

    #[test]
    fn test_single_scenario_rejected() {
        let input = ComparisonInput {
            scenarios: vec![scenario("only", AmortizationMethod::ConstantPayment)],
        };
        assert!(matches!(
            compare_scenarios(&input),
            Err(LoanSimError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_invalid_scenario_names_field() {
        let mut bad = scenario("bad", AmortizationMethod::ConstantPayment);
        bad.loan.term = 0;
        let input = ComparisonInput {
            scenarios: vec![scenario("ok", AmortizationMethod::ConstantPayment), bad],
        };
        match compare_scenarios(&input) {
            Err(LoanSimError::InvalidInput { field, .. }) => assert_eq!(field, "bad.term"),
            other => panic!("expected invalid input, got {:?}", other.map(|o| o.result.cheapest)),
        }
    }
}
