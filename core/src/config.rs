//! Declarative reference tables for the engine.
//!
//! Every threshold that shapes a classification lives here rather than
//! inline in logic: runway category bands, stage multipliers, variance
//! thresholds, perturbation steps, scenario parameters. The tables are
//! serde-deserializable so deployments can version and swap them, and
//! property tests can parametrize them. `EngineConfig::default()` is
//! the reference table set.

use crate::{
    categorizer::{CategoryBand, RunwayCategory},
    error::{EngineError, EngineResult},
    record::ThresholdClass,
    types::{CompanyStage, Month},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ordered descending by `min_months`.
    pub runway_bands: Vec<CategoryBand>,
    /// Stage -> variance threshold multiplier. Earlier stages tolerate
    /// larger deviations.
    pub stage_multipliers: BTreeMap<CompanyStage, f64>,
    /// Threshold class -> base variance threshold, as a fraction
    /// (0.10 = 10%).
    pub variance_thresholds: BTreeMap<ThresholdClass, f64>,
    pub sensitivity: SensitivityConfig,
    pub scenarios: ScenarioConfig,
    pub fundraising: FundraisingConfig,
    pub trend: TrendConfig,
    pub simulation: SimulationConfig,
    /// Months with a known seasonal dip in activity.
    pub seasonality_months: Vec<Month>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Hard bound on the month-by-month projection loop.
    pub horizon_months: u32,
    /// Average Gregorian month length used for cash-out dates.
    pub days_per_month: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Relative perturbations applied to each axis. Must include 0.0,
    /// which doubles as the zero-delta correctness check.
    pub burn_rate_steps: Vec<f64>,
    pub revenue_steps: Vec<f64>,
    pub growth_rate_steps: Vec<f64>,
    /// |runway delta| above this is High sensitivity, in months.
    pub high_cutoff_months: f64,
    /// |runway delta| above this is Moderate sensitivity, in months.
    pub moderate_cutoff_months: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub optimistic_growth_multiplier: f64,
    pub optimistic_burn_multiplier: f64,
    pub pessimistic_burn_multiplier: f64,
    pub pessimistic_growth_multiplier: f64,
    /// r in burn x (1 - r) for the cost-reduction scenario.
    pub cost_reduction_fraction: f64,
    /// The fundraising scenario is generated only below this basic
    /// runway.
    pub fundraising_trigger_runway_months: f64,
    /// Months until the raise lands.
    pub fundraising_timing_months: f64,
    /// Amount raised = max(burn x this, cash x fundraising_cash_multiple).
    pub fundraising_burn_months_raised: f64,
    pub fundraising_cash_multiple: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundraisingConfig {
    /// Expected duration of a fundraising process, in months.
    pub process_months: f64,
    /// Safety buffer between close and cash-out, in months.
    pub buffer_months: f64,
    /// optimal_start <= this is Urgent (<= 0 is always Late).
    pub urgent_cutoff_months: f64,
    /// optimal_start <= this is Soon.
    pub soon_cutoff_months: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Minimum aligned months before a trend is computed at all.
    pub min_months: usize,
    /// OLS slope below this (in variance-% per month) is Improving.
    pub improving_slope_cutoff: f64,
    /// OLS slope above this is Worsening.
    pub worsening_slope_cutoff: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon_months: 120,
            days_per_month: 30.44,
        }
    }
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            burn_rate_steps: vec![-0.20, -0.10, 0.0, 0.10, 0.20],
            revenue_steps: vec![-0.20, -0.10, 0.0, 0.10, 0.20],
            growth_rate_steps: vec![-0.50, -0.25, 0.0, 0.25, 0.50],
            high_cutoff_months: 3.0,
            moderate_cutoff_months: 1.0,
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            optimistic_growth_multiplier: 1.2,
            optimistic_burn_multiplier: 0.95,
            pessimistic_burn_multiplier: 1.1,
            pessimistic_growth_multiplier: 0.5,
            cost_reduction_fraction: 0.15,
            fundraising_trigger_runway_months: 12.0,
            fundraising_timing_months: 6.0,
            fundraising_burn_months_raised: 18.0,
            fundraising_cash_multiple: 2.0,
        }
    }
}

impl Default for FundraisingConfig {
    fn default() -> Self {
        Self {
            process_months: 6.0,
            buffer_months: 3.0,
            urgent_cutoff_months: 3.0,
            soon_cutoff_months: 6.0,
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            min_months: 3,
            improving_slope_cutoff: -1.0,
            worsening_slope_cutoff: 1.0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let runway_bands = vec![
            CategoryBand { min_months: 24.0, category: RunwayCategory::Excellent },
            CategoryBand { min_months: 18.0, category: RunwayCategory::VeryGood },
            CategoryBand { min_months: 12.0, category: RunwayCategory::Good },
            CategoryBand { min_months: 9.0, category: RunwayCategory::Warning },
            CategoryBand { min_months: 6.0, category: RunwayCategory::Concerning },
            CategoryBand { min_months: 3.0, category: RunwayCategory::Critical },
        ];

        let stage_multipliers = BTreeMap::from([
            (CompanyStage::PreSeed, 1.5),
            (CompanyStage::Seed, 1.3),
            (CompanyStage::SeriesA, 1.1),
            (CompanyStage::SeriesB, 1.0),
            (CompanyStage::Growth, 0.9),
            (CompanyStage::Mature, 0.8),
        ]);

        let variance_thresholds = BTreeMap::from([
            (ThresholdClass::Revenue, 0.10),
            (ThresholdClass::Customers, 0.15),
            (ThresholdClass::Cac, 0.25),
            (ThresholdClass::Churn, 0.30),
            (ThresholdClass::BurnRate, 0.20),
            (ThresholdClass::LtvCac, 0.35),
            (ThresholdClass::Runway, 0.25),
            (ThresholdClass::Other, 0.20),
        ]);

        Self {
            runway_bands,
            stage_multipliers,
            variance_thresholds,
            sensitivity: SensitivityConfig::default(),
            scenarios: ScenarioConfig::default(),
            fundraising: FundraisingConfig::default(),
            trend: TrendConfig::default(),
            simulation: SimulationConfig::default(),
            seasonality_months: vec![7, 8],
        }
    }
}

impl EngineConfig {
    /// Load a config override from a JSON file. Missing fields fall
    /// back to the reference tables.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.runway_bands.is_empty() {
            return Err(EngineError::InvalidConfig("empty runway band table".into()));
        }
        for pair in self.runway_bands.windows(2) {
            if pair[0].min_months <= pair[1].min_months {
                return Err(EngineError::InvalidConfig(
                    "runway bands must be sorted by descending min_months".into(),
                ));
            }
        }
        for (stage, mult) in &self.stage_multipliers {
            if *mult <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "non-positive stage multiplier for {}",
                    stage.key()
                )));
            }
        }
        for (class, threshold) in &self.variance_thresholds {
            if *threshold <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "non-positive variance threshold for {class:?}"
                )));
            }
        }
        for steps in [
            &self.sensitivity.burn_rate_steps,
            &self.sensitivity.revenue_steps,
            &self.sensitivity.growth_rate_steps,
        ] {
            if !steps.contains(&0.0) {
                return Err(EngineError::InvalidConfig(
                    "sensitivity steps must include the 0.0 baseline point".into(),
                ));
            }
        }
        if self.simulation.horizon_months == 0 {
            return Err(EngineError::InvalidConfig("zero simulation horizon".into()));
        }
        if self.trend.min_months < 2 {
            return Err(EngineError::InvalidConfig(
                "trend analysis needs at least 2 months".into(),
            ));
        }
        if self.fundraising.urgent_cutoff_months > self.fundraising.soon_cutoff_months {
            return Err(EngineError::InvalidConfig(
                "urgent cutoff must not exceed soon cutoff".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_override_keeps_reference_tables() {
        let config =
            EngineConfig::from_json(r#"{"simulation": {"horizon_months": 60}}"#).unwrap();
        assert_eq!(config.simulation.horizon_months, 60);
        // untouched sections stay at reference values
        assert_eq!(config.simulation.days_per_month, 30.44);
        assert_eq!(config.scenarios.cost_reduction_fraction, 0.15);
        assert_eq!(
            config.variance_thresholds[&ThresholdClass::Revenue],
            0.10
        );
    }

    #[test]
    fn unsorted_bands_rejected() {
        let mut config = EngineConfig::default();
        config.runway_bands.reverse();
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_zero_step_rejected() {
        let mut config = EngineConfig::default();
        config.sensitivity.burn_rate_steps = vec![-0.1, 0.1];
        assert!(config.validate().is_err());
    }
}
