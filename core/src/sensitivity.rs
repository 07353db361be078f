//! Sensitivity analyzer: perturb one input at a time, measure the
//! runway delta against the unperturbed baseline.
//!
//! The 0% perturbation point is computed through the exact same code
//! path as every other point. Its delta being exactly zero is a
//! correctness check, not an optimization to short-circuit.

use crate::{
    config::EngineConfig,
    error::EngineResult,
    projection::{self, RunwayInputs},
    types::RunwayMonths,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityAxis {
    BurnRate,
    Revenue,
    GrowthRate,
}

impl SensitivityAxis {
    pub const ALL: [SensitivityAxis; 3] = [
        SensitivityAxis::BurnRate,
        SensitivityAxis::Revenue,
        SensitivityAxis::GrowthRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SensitivityAxis::BurnRate => "burn_rate",
            SensitivityAxis::Revenue => "revenue",
            SensitivityAxis::GrowthRate => "growth_rate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityLevel {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityPoint {
    /// Relative perturbation in percent (-20.0 = input scaled x0.8).
    pub change_percent: f64,
    pub adjusted_value: f64,
    pub runway_months: RunwayMonths,
    /// Runway change vs. the unperturbed baseline, in months. Infinite
    /// runways are capped at the simulation horizon so deltas stay
    /// finite.
    pub runway_delta_months: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSensitivity {
    pub axis: SensitivityAxis,
    pub points: Vec<SensitivityPoint>,
    pub max_abs_delta_months: f64,
    pub level: SensitivityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub baseline_runway_months: f64,
    pub axes: Vec<AxisSensitivity>,
}

pub fn analyze(
    inputs: &RunwayInputs,
    as_of: DateTime<Utc>,
    config: &EngineConfig,
) -> EngineResult<SensitivityReport> {
    let horizon = config.simulation.horizon_months as f64;
    let baseline = projection::project(inputs, as_of, config)?
        .growth_adjusted
        .months
        .capped(horizon);

    let mut axes = Vec::with_capacity(SensitivityAxis::ALL.len());
    for axis in SensitivityAxis::ALL {
        let steps = match axis {
            SensitivityAxis::BurnRate => &config.sensitivity.burn_rate_steps,
            SensitivityAxis::Revenue => &config.sensitivity.revenue_steps,
            SensitivityAxis::GrowthRate => &config.sensitivity.growth_rate_steps,
        };

        let mut points = Vec::with_capacity(steps.len());
        for &step in steps {
            let (adjusted, adjusted_value) = perturb(inputs, axis, step);
            let months = projection::project(&adjusted, as_of, config)?
                .growth_adjusted
                .months;
            points.push(SensitivityPoint {
                change_percent: step * 100.0,
                adjusted_value,
                runway_months: months,
                runway_delta_months: months.capped(horizon) - baseline,
            });
        }

        let max_abs_delta_months = points
            .iter()
            .map(|p| p.runway_delta_months.abs())
            .fold(0.0, f64::max);
        axes.push(AxisSensitivity {
            axis,
            points,
            max_abs_delta_months,
            level: classify(max_abs_delta_months, config),
        });
    }

    Ok(SensitivityReport {
        baseline_runway_months: baseline,
        axes,
    })
}

fn perturb(inputs: &RunwayInputs, axis: SensitivityAxis, step: f64) -> (RunwayInputs, f64) {
    let mut adjusted = *inputs;
    let value = match axis {
        SensitivityAxis::BurnRate => {
            adjusted.monthly_burn_rate *= 1.0 + step;
            adjusted.monthly_burn_rate
        }
        SensitivityAxis::Revenue => {
            adjusted.monthly_revenue *= 1.0 + step;
            adjusted.monthly_revenue
        }
        SensitivityAxis::GrowthRate => {
            adjusted.growth_rate = projection::clamp_scaled_growth(adjusted.growth_rate * (1.0 + step));
            adjusted.growth_rate
        }
    };
    (adjusted, value)
}

fn classify(max_abs_delta: f64, config: &EngineConfig) -> SensitivityLevel {
    if max_abs_delta > config.sensitivity.high_cutoff_months {
        SensitivityLevel::High
    } else if max_abs_delta > config.sensitivity.moderate_cutoff_months {
        SensitivityLevel::Moderate
    } else {
        SensitivityLevel::Low
    }
}
