//! Scenario engine: the fixed what-if set re-run through the
//! simulator.
//!
//! Scenario generation is deterministic: the set of scenarios and
//! every number in them is a pure function of the inputs and the
//! config table. The fundraising scenario carries a deliberate
//! approximation (arithmetic runway extension instead of a
//! re-simulation with the injected cash); it is preserved for
//! compatibility with downstream reports and flagged as
//! `simplified_extension` in the result.

use crate::{
    categorizer,
    config::EngineConfig,
    error::EngineResult,
    projection::{self, RunwayEstimate, RunwayInputs},
    types::RunwayMonths,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Base,
    Optimistic,
    Pessimistic,
    CostReduction,
    Fundraising,
}

impl ScenarioKind {
    pub fn name(self) -> &'static str {
        match self {
            ScenarioKind::Base => "Base Scenario",
            ScenarioKind::Optimistic => "Optimistic Scenario",
            ScenarioKind::Pessimistic => "Pessimistic Scenario",
            ScenarioKind::CostReduction => "Cost Reduction Scenario",
            ScenarioKind::Fundraising => "Fundraising Scenario",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FundraisingInjection {
    pub timing_months: f64,
    pub amount: f64,
}

/// The parameter delta a scenario applies on top of the base inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioAssumptions {
    pub burn_multiplier: f64,
    pub growth_multiplier: f64,
    pub fundraising: Option<FundraisingInjection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub kind: ScenarioKind,
    pub name: &'static str,
    pub description: String,
    pub assumptions: ScenarioAssumptions,
    pub runway: RunwayEstimate,
    /// The runway was extended arithmetically
    /// (timing + amount / net burn) instead of re-simulated.
    pub simplified_extension: bool,
}

/// Generate the fixed scenario set. The fundraising scenario appears
/// only when the basic runway is below the configured trigger.
pub fn generate(
    inputs: &RunwayInputs,
    as_of: DateTime<Utc>,
    config: &EngineConfig,
) -> EngineResult<BTreeMap<ScenarioKind, ScenarioResult>> {
    let sc = &config.scenarios;
    let mut scenarios = BTreeMap::new();

    scenarios.insert(
        ScenarioKind::Base,
        perturbed(
            ScenarioKind::Base,
            "Current growth and spending held constant".to_string(),
            inputs,
            1.0,
            1.0,
            as_of,
            config,
        )?,
    );

    scenarios.insert(
        ScenarioKind::Optimistic,
        perturbed(
            ScenarioKind::Optimistic,
            format!(
                "Growth x{}, costs x{}",
                sc.optimistic_growth_multiplier, sc.optimistic_burn_multiplier
            ),
            inputs,
            sc.optimistic_burn_multiplier,
            sc.optimistic_growth_multiplier,
            as_of,
            config,
        )?,
    );

    scenarios.insert(
        ScenarioKind::Pessimistic,
        perturbed(
            ScenarioKind::Pessimistic,
            format!(
                "Burn x{}, growth x{}",
                sc.pessimistic_burn_multiplier, sc.pessimistic_growth_multiplier
            ),
            inputs,
            sc.pessimistic_burn_multiplier,
            sc.pessimistic_growth_multiplier,
            as_of,
            config,
        )?,
    );

    scenarios.insert(
        ScenarioKind::CostReduction,
        perturbed(
            ScenarioKind::CostReduction,
            format!(
                "Costs reduced by {:.0}%",
                sc.cost_reduction_fraction * 100.0
            ),
            inputs,
            1.0 - sc.cost_reduction_fraction,
            1.0,
            as_of,
            config,
        )?,
    );

    let basic_months = projection::project(inputs, as_of, config)?.basic.months;
    if let RunwayMonths::Finite(months) = basic_months {
        if months < sc.fundraising_trigger_runway_months {
            scenarios.insert(
                ScenarioKind::Fundraising,
                fundraising_scenario(inputs, months, as_of, config)?,
            );
        }
    }

    Ok(scenarios)
}

fn perturbed(
    kind: ScenarioKind,
    description: String,
    inputs: &RunwayInputs,
    burn_multiplier: f64,
    growth_multiplier: f64,
    as_of: DateTime<Utc>,
    config: &EngineConfig,
) -> EngineResult<ScenarioResult> {
    let mut growth = projection::clamp_scaled_growth(inputs.growth_rate * growth_multiplier);
    if kind == ScenarioKind::Pessimistic {
        // Slowed growth never goes negative in the pessimistic case.
        growth = growth.max(0.0);
    }
    let adjusted = RunwayInputs {
        cash_balance: inputs.cash_balance,
        monthly_burn_rate: inputs.monthly_burn_rate * burn_multiplier,
        monthly_revenue: inputs.monthly_revenue,
        growth_rate: growth,
    };
    let runway = projection::project(&adjusted, as_of, config)?.growth_adjusted;
    Ok(ScenarioResult {
        kind,
        name: kind.name(),
        description,
        assumptions: ScenarioAssumptions {
            burn_multiplier,
            growth_multiplier,
            fundraising: None,
        },
        runway,
        simplified_extension: false,
    })
}

fn fundraising_scenario(
    inputs: &RunwayInputs,
    basic_months: f64,
    as_of: DateTime<Utc>,
    config: &EngineConfig,
) -> EngineResult<ScenarioResult> {
    let sc = &config.scenarios;
    let amount = (inputs.monthly_burn_rate * sc.fundraising_burn_months_raised)
        .max(inputs.cash_balance * sc.fundraising_cash_multiple);
    let timing = sc.fundraising_timing_months;
    let injection = FundraisingInjection {
        timing_months: timing,
        amount,
    };
    let assumptions = ScenarioAssumptions {
        burn_multiplier: 1.0,
        growth_multiplier: 1.0,
        fundraising: Some(injection),
    };

    if basic_months < timing {
        // Cash runs out before the raise lands. The runway is extended
        // arithmetically rather than re-simulated, a known
        // simplification kept for report compatibility.
        let net_burn = inputs.net_burn(); // > 0, basic runway is finite
        let extended = timing + amount / net_burn;
        let months = RunwayMonths::Finite(extended);
        return Ok(ScenarioResult {
            kind: ScenarioKind::Fundraising,
            name: ScenarioKind::Fundraising.name(),
            description: format!(
                "Raise ${amount:.0} landing in {timing:.0} months \
                 (simplified: raise applied arithmetically, not re-simulated)"
            ),
            assumptions,
            runway: RunwayEstimate {
                months,
                category: categorizer::categorize(months, &config.runway_bands),
                cash_out_date: projection::cash_out_date(as_of, extended, config),
                simulation_horizon_reached: false,
                breakeven_reached: false,
                projections: Vec::new(),
            },
            simplified_extension: true,
        });
    }

    // Raise lands inside the current runway: model it as upfront cash
    // and re-simulate.
    let funded = RunwayInputs {
        cash_balance: inputs.cash_balance + amount,
        ..*inputs
    };
    let runway = projection::project(&funded, as_of, config)?.growth_adjusted;
    Ok(ScenarioResult {
        kind: ScenarioKind::Fundraising,
        name: ScenarioKind::Fundraising.name(),
        description: format!("Raise ${amount:.0} landing in {timing:.0} months"),
        assumptions,
        runway,
        simplified_extension: false,
    })
}
