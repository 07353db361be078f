//! Cash projection simulator: basic and growth-adjusted runway.
//!
//! RULES:
//!   - The month loop is bounded by the configured horizon (120).
//!   - A zero-crossing between two months is interpolated linearly
//!     over the unclamped balances; the fractional month is the
//!     answer, never the integer month index.
//!   - Hitting the horizon without a crossing is reported with
//!     `simulation_horizon_reached = true`, not as a precise runway.

use crate::{
    categorizer::{self, RunwayCategory},
    config::EngineConfig,
    error::{EngineError, EngineResult},
    types::RunwayMonths,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Inputs to a runway projection. Cash and revenue must be
/// non-negative; burn may be negative (a net-profitable company).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunwayInputs {
    pub cash_balance: f64,
    pub monthly_burn_rate: f64,
    pub monthly_revenue: f64,
    /// Compounding monthly revenue growth, e.g. 0.10 for 10%.
    pub growth_rate: f64,
}

impl RunwayInputs {
    pub fn net_burn(&self) -> f64 {
        self.monthly_burn_rate - self.monthly_revenue
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.cash_balance < 0.0 {
            return Err(EngineError::NegativeValue {
                field: "cash_balance",
                value: self.cash_balance,
            });
        }
        if self.monthly_revenue < 0.0 {
            return Err(EngineError::NegativeValue {
                field: "monthly_revenue",
                value: self.monthly_revenue,
            });
        }
        if self.growth_rate <= -1.0 || !self.growth_rate.is_finite() {
            return Err(EngineError::InvalidGrowthRate(self.growth_rate));
        }
        Ok(())
    }
}

/// One simulated month, for charting. Balances are clamped at zero
/// here; the interpolation that produces the runway figure uses the
/// unclamped values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub month: u32,
    pub revenue: f64,
    pub net_burn: f64,
    pub cash_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunwayEstimate {
    pub months: RunwayMonths,
    pub category: RunwayCategory,
    /// Absent when runway is infinite, only horizon-bounded, or too
    /// far out for date arithmetic.
    pub cash_out_date: Option<DateTime<Utc>>,
    /// The simulation ran out of horizon before cash ran out; `months`
    /// is a lower bound, not a cash-out prediction.
    pub simulation_horizon_reached: bool,
    /// Some simulated month had net burn <= 0.
    pub breakeven_reached: bool,
    pub projections: Vec<ProjectionPoint>,
}

/// Snapshot of the inputs plus both runway estimates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashProjection {
    pub inputs: RunwayInputs,
    pub net_burn_rate: f64,
    pub basic: RunwayEstimate,
    pub growth_adjusted: RunwayEstimate,
}

pub fn project(
    inputs: &RunwayInputs,
    as_of: DateTime<Utc>,
    config: &EngineConfig,
) -> EngineResult<CashProjection> {
    inputs.validate()?;
    Ok(CashProjection {
        inputs: *inputs,
        net_burn_rate: inputs.net_burn(),
        basic: basic_runway(inputs, as_of, config),
        growth_adjusted: growth_adjusted_runway(inputs, as_of, config),
    })
}

/// Constant burn, constant revenue: runway = cash / net burn.
fn basic_runway(inputs: &RunwayInputs, as_of: DateTime<Utc>, config: &EngineConfig) -> RunwayEstimate {
    let net_burn = inputs.net_burn();
    if net_burn <= 0.0 {
        return infinite_estimate(config);
    }

    let months = inputs.cash_balance / net_burn;
    RunwayEstimate {
        months: RunwayMonths::Finite(months),
        category: categorizer::categorize(RunwayMonths::Finite(months), &config.runway_bands),
        cash_out_date: cash_out_date(as_of, months, config),
        simulation_horizon_reached: false,
        breakeven_reached: false,
        projections: Vec::new(),
    }
}

/// Month-by-month simulation with compounding revenue growth.
fn growth_adjusted_runway(
    inputs: &RunwayInputs,
    as_of: DateTime<Utc>,
    config: &EngineConfig,
) -> RunwayEstimate {
    // Already cash-flow positive and not shrinking: no simulation can
    // produce a crossing.
    if inputs.net_burn() <= 0.0 && inputs.growth_rate >= 0.0 {
        return infinite_estimate(config);
    }

    let horizon = config.simulation.horizon_months;
    let mut cash = inputs.cash_balance;
    let mut revenue = inputs.monthly_revenue;
    let mut points = Vec::new();
    let mut crossing: Option<f64> = None;
    let mut breakeven = false;

    for month in 0..horizon {
        let net_burn = inputs.monthly_burn_rate - revenue;
        if net_burn <= 0.0 {
            breakeven = true;
        }
        let next_cash = cash - net_burn;
        points.push(ProjectionPoint {
            month: month + 1,
            revenue,
            net_burn,
            cash_balance: next_cash.max(0.0),
        });

        if next_cash <= 0.0 && net_burn > 0.0 {
            // Linear interpolation between the month-start balance
            // (>= 0) and the unclamped month-end balance.
            let fraction = cash / net_burn;
            crossing = Some(month as f64 + fraction);
            break;
        }

        cash = next_cash;
        revenue *= 1.0 + inputs.growth_rate;
    }

    match crossing {
        Some(months) => RunwayEstimate {
            months: RunwayMonths::Finite(months),
            category: categorizer::categorize(RunwayMonths::Finite(months), &config.runway_bands),
            cash_out_date: cash_out_date(as_of, months, config),
            simulation_horizon_reached: false,
            breakeven_reached: breakeven,
            projections: points,
        },
        None => {
            let months = horizon as f64;
            RunwayEstimate {
                months: RunwayMonths::Finite(months),
                category: categorizer::categorize(
                    RunwayMonths::Finite(months),
                    &config.runway_bands,
                ),
                cash_out_date: None,
                simulation_horizon_reached: true,
                breakeven_reached: breakeven,
                projections: points,
            }
        }
    }
}

fn infinite_estimate(config: &EngineConfig) -> RunwayEstimate {
    RunwayEstimate {
        months: RunwayMonths::Infinite,
        category: categorizer::categorize(RunwayMonths::Infinite, &config.runway_bands),
        cash_out_date: None,
        simulation_horizon_reached: false,
        breakeven_reached: true,
        projections: Vec::new(),
    }
}

/// Converts a runway figure into a calendar date. Returns `None` when
/// the figure is so large that the offset leaves chrono's range; a
/// valid cash balance can produce runways of trillions of months.
pub(crate) fn cash_out_date(
    as_of: DateTime<Utc>,
    months: f64,
    config: &EngineConfig,
) -> Option<DateTime<Utc>> {
    let seconds = months * config.simulation.days_per_month * 86_400.0;
    if !seconds.is_finite() {
        return None;
    }
    let delta = Duration::try_seconds(seconds.round() as i64)?;
    as_of.checked_add_signed(delta)
}

/// Scenario and sensitivity multipliers can push a valid growth rate
/// to -1 or below, which `validate` rejects; hold scaled rates just
/// inside the accepted domain.
pub(crate) fn clamp_scaled_growth(rate: f64) -> f64 {
    const FLOOR: f64 = -1.0 + 1e-9;
    rate.max(FLOOR)
}
