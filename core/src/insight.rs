//! Key-insight extraction from structured analysis results.
//!
//! Insights are derived purely from computed results; nothing here
//! re-reads raw records. Two entry points mirror the two analyses:
//! one over a cash projection plus its scenarios, one over the
//! significant variances plus the trend summary.

use crate::{
    categorizer::RunwayCategory,
    config::EngineConfig,
    projection::CashProjection,
    record::MetricCategory,
    scenario::{ScenarioKind, ScenarioResult},
    significance::Significance,
    trend::{TrendDirection, TrendSummary},
    types::RunwayMonths,
    variance::VarianceRecord,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    RunwayStatus,
    GrowthImpact,
    ScenarioRange,
    BreakevenPossible,
    CriticalVariances,
    ImprovingAccuracy,
    WorseningAccuracy,
    CategoryConcentration,
    SystemicPlanningIssue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSeverity {
    Positive,
    Info,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub severity: InsightSeverity,
    pub title: String,
    pub detail: String,
}

fn months_label(months: RunwayMonths) -> String {
    match months.finite() {
        Some(m) => format!("{m:.1} months"),
        None => "indefinite".to_string(),
    }
}

fn runway_severity(category: RunwayCategory) -> InsightSeverity {
    match category {
        RunwayCategory::Infinite | RunwayCategory::Excellent | RunwayCategory::VeryGood => {
            InsightSeverity::Positive
        }
        RunwayCategory::Good => InsightSeverity::Info,
        RunwayCategory::Warning | RunwayCategory::Concerning => InsightSeverity::Medium,
        RunwayCategory::Critical => InsightSeverity::High,
        RunwayCategory::Emergency => InsightSeverity::Critical,
    }
}

pub fn runway_insights(
    projection: &CashProjection,
    scenarios: Option<&BTreeMap<ScenarioKind, ScenarioResult>>,
) -> Vec<Insight> {
    let mut insights = Vec::new();
    let basic = &projection.basic;
    let growth = &projection.growth_adjusted;

    insights.push(Insight {
        kind: InsightKind::RunwayStatus,
        severity: runway_severity(basic.category),
        title: format!("Runway: {}", months_label(basic.months)),
        detail: basic.category.description().to_string(),
    });

    if growth.months != basic.months {
        let detail = format!(
            "At {:.0}% monthly revenue growth the runway moves from {} to {}",
            projection.inputs.growth_rate * 100.0,
            months_label(basic.months),
            months_label(growth.months),
        );
        let title = match (basic.months.finite(), growth.months.finite()) {
            (Some(b), Some(g)) => format!("Growth extends runway by {:.1} months", g - b),
            _ => "Growth pushes the company past its cash-out point".to_string(),
        };
        insights.push(Insight {
            kind: InsightKind::GrowthImpact,
            severity: InsightSeverity::Positive,
            title,
            detail,
        });
    }

    if let Some(scenarios) = scenarios {
        let best = scenarios.values().max_by(|a, b| {
            a.runway
                .months
                .partial_cmp(&b.runway.months)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let worst = scenarios.values().min_by(|a, b| {
            a.runway
                .months
                .partial_cmp(&b.runway.months)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if let (Some(best), Some(worst)) = (best, worst) {
            insights.push(Insight {
                kind: InsightKind::ScenarioRange,
                severity: InsightSeverity::Info,
                title: format!(
                    "Runway range: {} to {}",
                    months_label(worst.runway.months),
                    months_label(best.runway.months),
                ),
                detail: format!("Best case {}, worst case {}", best.name, worst.name),
            });
        }
    }

    if growth.breakeven_reached {
        insights.push(Insight {
            kind: InsightKind::BreakevenPossible,
            severity: InsightSeverity::Positive,
            title: "Breakeven is reachable".to_string(),
            detail: "At the current growth rate revenue overtakes spending within the projection"
                .to_string(),
        });
    }

    insights
}

pub fn variance_insights(
    significant: &[VarianceRecord],
    trend: &TrendSummary,
    _config: &EngineConfig,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    let critical: Vec<&VarianceRecord> = significant
        .iter()
        .filter(|v| v.significance == Significance::Critical)
        .collect();
    if !critical.is_empty() {
        let metrics: BTreeSet<&str> = critical.iter().map(|v| v.metric.name()).collect();
        insights.push(Insight {
            kind: InsightKind::CriticalVariances,
            severity: InsightSeverity::Critical,
            title: "Critical plan deviations detected".to_string(),
            detail: format!(
                "{} critical data points across: {}",
                critical.len(),
                metrics.into_iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    if let TrendSummary::Computed(report) = trend {
        match report.direction {
            TrendDirection::Improving => insights.push(Insight {
                kind: InsightKind::ImprovingAccuracy,
                severity: InsightSeverity::Positive,
                title: "Planning accuracy is improving".to_string(),
                detail: "Variances are shrinking month over month".to_string(),
            }),
            TrendDirection::Worsening => insights.push(Insight {
                kind: InsightKind::WorseningAccuracy,
                severity: InsightSeverity::Medium,
                title: "Planning accuracy is deteriorating".to_string(),
                detail: "Variances are widening month over month".to_string(),
            }),
            TrendDirection::Stable => {}
        }
    }

    if !significant.is_empty() {
        let mut by_category: BTreeMap<MetricCategory, usize> = BTreeMap::new();
        for variance in significant {
            *by_category.entry(variance.category).or_default() += 1;
        }
        if let Some((&category, &count)) = by_category.iter().max_by_key(|&(_, &count)| count) {
            insights.push(Insight {
                kind: InsightKind::CategoryConcentration,
                severity: InsightSeverity::Medium,
                title: format!("Most deviations concentrate in {}", category.key()),
                detail: format!("{count} significant variances in this category"),
            });
        }
    }

    let revenue_count = significant
        .iter()
        .filter(|v| v.category == MetricCategory::Revenue)
        .count();
    let cost_count = significant
        .iter()
        .filter(|v| v.category == MetricCategory::Costs)
        .count();
    if revenue_count >= 3 && cost_count >= 3 {
        insights.push(Insight {
            kind: InsightKind::SystemicPlanningIssue,
            severity: InsightSeverity::High,
            title: "Systemic planning issues".to_string(),
            detail: "Repeated deviations on both the revenue and the cost side".to_string(),
        });
    }

    insights
}
