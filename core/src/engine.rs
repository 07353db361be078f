//! Engine entry points tying the analysis components together.
//!
//! `ForecastEngine` owns a validated config and exposes the two
//! operations: cash runway analysis from current inputs, and
//! plan-vs-actual variance analysis over monthly records. Both are
//! pure given their arguments, the caller supplies the `as_of`
//! timestamp.

use crate::{
    config::EngineConfig,
    error::EngineResult,
    fundraising::{self, FundraisingAdvice},
    insight::{self, Insight},
    projection::{self, CashProjection, RunwayInputs},
    record::{Metric, MonthlyFinancialRecord},
    root_cause::{self, PeriodRootCauses},
    scenario::{self, ScenarioKind, ScenarioResult},
    sensitivity::{self, SensitivityReport},
    trend::{self, TrendSummary},
    types::CompanyStage,
    variance::{self, AlignmentStatus, VarianceRecord},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct RunwayAnalysis {
    pub as_of: DateTime<Utc>,
    pub projection: CashProjection,
    /// Absent when the caller opted out of scenario generation.
    pub scenarios: Option<BTreeMap<ScenarioKind, ScenarioResult>>,
    pub sensitivity: SensitivityReport,
    pub fundraising: FundraisingAdvice,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricAverage {
    pub metric: Metric,
    pub avg_abs_variance_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceSummary {
    pub metrics_analyzed: usize,
    pub total_data_points: usize,
    pub overall_avg_variance_percent: f64,
    pub variance_volatility: f64,
    /// Up to three metrics with the largest mean |variance %|.
    pub worst_metrics: Vec<MetricAverage>,
    /// Up to three metrics with the smallest mean |variance %|.
    pub best_metrics: Vec<MetricAverage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceReport {
    pub as_of: DateTime<Utc>,
    pub stage: CompanyStage,
    pub alignment: AlignmentStatus,
    pub aligned_months: usize,
    pub variances: Vec<VarianceRecord>,
    pub significant: Vec<VarianceRecord>,
    pub summary: Option<VarianceSummary>,
    pub root_causes: Vec<PeriodRootCauses>,
    pub trend: TrendSummary,
    pub insights: Vec<Insight>,
}

#[derive(Debug, Clone)]
pub struct ForecastEngine {
    config: EngineConfig,
}

impl ForecastEngine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full runway analysis: basic and growth-adjusted projections,
    /// sensitivity, fundraising timing and optionally the scenario set.
    pub fn calculate_runway(
        &self,
        inputs: &RunwayInputs,
        include_scenarios: bool,
        as_of: DateTime<Utc>,
    ) -> EngineResult<RunwayAnalysis> {
        let projection = projection::project(inputs, as_of, &self.config)?;
        log::info!(
            "Runway: {:.1} months basic at net burn {:.0}",
            projection
                .basic
                .months
                .capped(self.config.simulation.horizon_months as f64),
            projection.net_burn_rate,
        );

        let scenarios = if include_scenarios {
            Some(scenario::generate(inputs, as_of, &self.config)?)
        } else {
            None
        };
        let sensitivity = sensitivity::analyze(inputs, as_of, &self.config)?;
        let fundraising = fundraising::advise(projection.basic.months, as_of, &self.config);
        let insights = insight::runway_insights(&projection, scenarios.as_ref());

        Ok(RunwayAnalysis {
            as_of,
            projection,
            scenarios,
            sensitivity,
            fundraising,
            insights,
        })
    }

    /// Plan-vs-actual variance analysis over monthly records.
    pub fn analyze_variance(
        &self,
        planned: &[MonthlyFinancialRecord],
        actual: &[MonthlyFinancialRecord],
        stage: CompanyStage,
        as_of: DateTime<Utc>,
    ) -> EngineResult<VarianceReport> {
        for record in planned.iter().chain(actual) {
            record.validate()?;
        }

        let (aligned, alignment) = variance::align(planned, actual)?;
        let variances = variance::compute(&aligned, stage, &self.config);
        let significant: Vec<VarianceRecord> = variances
            .iter()
            .filter(|v| v.significance.is_significant())
            .cloned()
            .collect();
        log::info!(
            "Variance: {} aligned months, {} records, {} significant",
            aligned.len(),
            variances.len(),
            significant.len(),
        );

        let root_causes = root_cause::analyze(&variances, &aligned, &self.config);
        let trend = trend::analyze(&aligned, &self.config);
        let insights = insight::variance_insights(&significant, &trend, &self.config);

        Ok(VarianceReport {
            as_of,
            stage,
            alignment,
            aligned_months: aligned.len(),
            summary: summarize(&variances),
            variances,
            significant,
            root_causes,
            trend,
            insights,
        })
    }
}

fn summarize(variances: &[VarianceRecord]) -> Option<VarianceSummary> {
    if variances.is_empty() {
        return None;
    }

    let mut by_metric: BTreeMap<Metric, Vec<f64>> = BTreeMap::new();
    for variance in variances {
        by_metric
            .entry(variance.metric)
            .or_default()
            .push(variance.variance_percent.abs());
    }

    let mut averages: Vec<MetricAverage> = by_metric
        .iter()
        .map(|(&metric, values)| MetricAverage {
            metric,
            avg_abs_variance_percent: values.iter().sum::<f64>() / values.len() as f64,
        })
        .collect();
    averages.sort_by(|a, b| {
        b.avg_abs_variance_percent
            .partial_cmp(&a.avg_abs_variance_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let worst_metrics: Vec<MetricAverage> = averages.iter().take(3).cloned().collect();
    let best_metrics: Vec<MetricAverage> = averages.iter().rev().take(3).cloned().collect();

    let all: Vec<f64> = variances.iter().map(|v| v.variance_percent.abs()).collect();
    let mean = all.iter().sum::<f64>() / all.len() as f64;
    let volatility =
        (all.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / all.len() as f64).sqrt();

    Some(VarianceSummary {
        metrics_analyzed: by_metric.len(),
        total_data_points: variances.len(),
        overall_avg_variance_percent: mean,
        variance_volatility: volatility,
        worst_metrics,
        best_metrics,
    })
}
