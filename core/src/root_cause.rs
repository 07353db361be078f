//! Root-cause analysis for significant plan deviations.
//!
//! Works month by month over the significant variances. Three lenses
//! are applied to each month: interconnected metric pairs (primary
//! causes), external factors (seasonality, broad market moves, churn
//! spikes) and execution quality per metric category.

use crate::{
    config::EngineConfig,
    record::{Metric, MetricCategory, MonthlyFinancialRecord},
    significance::Significance,
    types::{Month, Year},
    variance::{AlignedMonth, VarianceRecord},
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCause {
    /// Revenue and customer counts both moved, and revenue per new
    /// customer shifted by more than 20% against plan.
    ArpuShift,
    /// Revenue and customer counts both moved with ARPU roughly
    /// intact, pointing at acquisition volume rather than pricing.
    CustomerAcquisitionShortfall,
    /// Effective acquisition cost came in more than 1.5x plan.
    MarketingEfficiencyDrop,
    /// Effective acquisition cost came in under 0.7x plan.
    MarketingEfficiencyGain,
    /// Burn grew while revenue fell.
    CostsUpRevenueDown,
    /// Burn and revenue both grew, spend is running ahead of growth.
    InvestmentGrowth,
}

impl fmt::Display for RootCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RootCause::ArpuShift => "average revenue per new customer shifted against plan",
            RootCause::CustomerAcquisitionShortfall => "customer acquisition fell short of plan",
            RootCause::MarketingEfficiencyDrop => "marketing efficiency dropped, CAC above plan",
            RootCause::MarketingEfficiencyGain => "marketing efficiency improved, CAC below plan",
            RootCause::CostsUpRevenueDown => "costs grew while revenue declined",
            RootCause::InvestmentGrowth => "investment-driven growth, spend ahead of revenue",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalFactor {
    /// Negative revenue-side variance in a configured low-season month.
    SeasonalSlowdown,
    /// Three or more high or critical variances in a single month.
    BroadMarketImpact,
    /// Churn rate exceeded plan by more than two percentage points.
    ChurnSpike,
}

impl fmt::Display for ExternalFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExternalFactor::SeasonalSlowdown => "seasonal slowdown in a low-activity month",
            ExternalFactor::BroadMarketImpact => "possible market or macroeconomic impact",
            ExternalFactor::ChurnSpike => "customer churn rose sharply over plan",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionIssue {
    /// More than half of the revenue-side variances were misses.
    WeakRevenueExecution,
    /// More than 70% of the cost variances were overruns.
    CostOverruns,
    /// CAC over plan by more than 20%.
    AcquisitionEfficiencyLoss,
}

impl fmt::Display for ExecutionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExecutionIssue::WeakRevenueExecution => "weak revenue generation against plan",
            ExecutionIssue::CostOverruns => "cost control slipping across categories",
            ExecutionIssue::AcquisitionEfficiencyLoss => "customer acquisition efficiency declining",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodRootCauses {
    pub year: Year,
    pub month: Month,
    pub significant_variance_count: usize,
    pub primary_causes: Vec<RootCause>,
    pub external_factors: Vec<ExternalFactor>,
    pub execution_issues: Vec<ExecutionIssue>,
    pub most_critical: VarianceRecord,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn primary_causes(
    metrics: &[Metric],
    variances: &[&VarianceRecord],
    planned: &MonthlyFinancialRecord,
    actual: &MonthlyFinancialRecord,
) -> Vec<RootCause> {
    let mut causes = Vec::new();
    let has = |m: Metric| metrics.contains(&m);
    let amount = |m: Metric| {
        variances
            .iter()
            .find(|v| v.metric == m)
            .map(|v| v.variance_amount)
            .unwrap_or(0.0)
    };

    if has(Metric::TotalRevenue) && has(Metric::NewCustomers) {
        let planned_arpu = ratio(planned.total_revenue, planned.new_customers as f64);
        let actual_arpu = ratio(actual.total_revenue, actual.new_customers as f64);
        if planned_arpu > 0.0 && ((actual_arpu - planned_arpu) / planned_arpu).abs() > 0.2 {
            causes.push(RootCause::ArpuShift);
        } else {
            causes.push(RootCause::CustomerAcquisitionShortfall);
        }
    }

    if has(Metric::MarketingSpend) && has(Metric::NewCustomers) {
        let planned_cac = ratio(planned.marketing_spend, planned.new_customers as f64);
        let actual_cac = ratio(actual.marketing_spend, actual.new_customers as f64);
        if actual_cac > planned_cac * 1.5 {
            causes.push(RootCause::MarketingEfficiencyDrop);
        } else if actual_cac < planned_cac * 0.7 {
            causes.push(RootCause::MarketingEfficiencyGain);
        }
    }

    if has(Metric::BurnRate) && has(Metric::TotalRevenue) {
        let burn = amount(Metric::BurnRate);
        let revenue = amount(Metric::TotalRevenue);
        if burn > 0.0 && revenue < 0.0 {
            causes.push(RootCause::CostsUpRevenueDown);
        } else if burn > 0.0 && revenue > 0.0 {
            causes.push(RootCause::InvestmentGrowth);
        }
    }

    causes
}

fn external_factors(
    month: Month,
    variances: &[&VarianceRecord],
    planned: &MonthlyFinancialRecord,
    actual: &MonthlyFinancialRecord,
    config: &EngineConfig,
) -> Vec<ExternalFactor> {
    let mut factors = Vec::new();

    if config.seasonality_months.contains(&month) {
        let seasonal_miss = variances
            .iter()
            .any(|v| v.category == MetricCategory::Revenue && v.variance_amount < 0.0);
        if seasonal_miss {
            factors.push(ExternalFactor::SeasonalSlowdown);
        }
    }

    let severe = variances
        .iter()
        .filter(|v| v.significance >= Significance::High)
        .count();
    if severe >= 3 {
        factors.push(ExternalFactor::BroadMarketImpact);
    }

    if actual.churn_rate - planned.churn_rate > 0.02 {
        factors.push(ExternalFactor::ChurnSpike);
    }

    factors
}

fn execution_issues(variances: &[&VarianceRecord]) -> Vec<ExecutionIssue> {
    let mut issues = Vec::new();

    let revenue: Vec<_> = variances
        .iter()
        .filter(|v| v.category == MetricCategory::Revenue)
        .collect();
    if !revenue.is_empty() {
        let misses = revenue.iter().filter(|v| v.variance_amount < 0.0).count();
        if misses as f64 > revenue.len() as f64 * 0.5 {
            issues.push(ExecutionIssue::WeakRevenueExecution);
        }
    }

    let costs: Vec<_> = variances
        .iter()
        .filter(|v| v.category == MetricCategory::Costs)
        .collect();
    if !costs.is_empty() {
        let overruns = costs.iter().filter(|v| v.variance_amount > 0.0).count();
        if overruns as f64 > costs.len() as f64 * 0.7 {
            issues.push(ExecutionIssue::CostOverruns);
        }
    }

    if let Some(cac) = variances.iter().find(|v| v.metric == Metric::Cac) {
        if cac.variance_amount > 0.0 && cac.variance_percent > 20.0 {
            issues.push(ExecutionIssue::AcquisitionEfficiencyLoss);
        }
    }

    issues
}

/// Analyze root causes for every month that carries at least one
/// significant variance. Months without matched plan and actual data
/// never reach this function, alignment already dropped them.
pub fn analyze(
    variances: &[VarianceRecord],
    aligned: &[AlignedMonth<'_>],
    config: &EngineConfig,
) -> Vec<PeriodRootCauses> {
    let mut by_period: BTreeMap<(Year, Month), Vec<&VarianceRecord>> = BTreeMap::new();
    for variance in variances.iter().filter(|v| v.significance.is_significant()) {
        by_period
            .entry((variance.year, variance.month))
            .or_default()
            .push(variance);
    }

    let mut periods = Vec::new();
    for ((year, month), month_variances) in by_period {
        let Some(pair) = aligned.iter().find(|a| a.year == year && a.month == month) else {
            continue;
        };
        let metrics: Vec<Metric> = month_variances.iter().map(|v| v.metric).collect();

        // max_by of an ordered significance keeps the last maximum,
        // the stable metric ordering makes the pick deterministic.
        let most_critical = month_variances
            .iter()
            .max_by_key(|v| v.significance)
            .map(|v| (*v).clone());
        let Some(most_critical) = most_critical else {
            continue;
        };

        periods.push(PeriodRootCauses {
            year,
            month,
            significant_variance_count: month_variances.len(),
            primary_causes: primary_causes(&metrics, &month_variances, pair.planned, pair.actual),
            external_factors: external_factors(
                month,
                &month_variances,
                pair.planned,
                pair.actual,
                config,
            ),
            execution_issues: execution_issues(&month_variances),
            most_critical,
        });
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;
    use crate::types::CompanyStage;
    use crate::variance;

    fn month_pair(
        month: Month,
        plan_fill: impl FnOnce(&mut MonthlyFinancialRecord),
        actual_fill: impl FnOnce(&mut MonthlyFinancialRecord),
    ) -> (MonthlyFinancialRecord, MonthlyFinancialRecord) {
        let mut plan = MonthlyFinancialRecord::new(RecordKind::Plan, 2025, month);
        let mut actual = MonthlyFinancialRecord::new(RecordKind::Actual, 2025, month);
        plan_fill(&mut plan);
        actual_fill(&mut actual);
        (plan, actual)
    }

    fn run(
        plan: MonthlyFinancialRecord,
        actual: MonthlyFinancialRecord,
    ) -> Vec<PeriodRootCauses> {
        let config = EngineConfig::default();
        let plans = vec![plan];
        let actuals = vec![actual];
        let (aligned, _) = variance::align(&plans, &actuals).unwrap();
        let records = variance::compute(&aligned, CompanyStage::SeriesA, &config);
        analyze(&records, &aligned, &config)
    }

    #[test]
    fn arpu_shift_detected_when_price_moves() {
        // Revenue halves against a 20% customer shortfall, so revenue
        // per new customer drops from 1000 to 625.
        let (plan, actual) = month_pair(
            3,
            |p| {
                p.total_revenue = 100_000.0;
                p.new_customers = 100;
            },
            |a| {
                a.total_revenue = 50_000.0;
                a.new_customers = 80;
            },
        );
        let periods = run(plan, actual);
        assert_eq!(periods.len(), 1);
        assert!(periods[0].primary_causes.contains(&RootCause::ArpuShift));
    }

    #[test]
    fn stable_arpu_points_at_acquisition() {
        // Both fall by 40%, ARPU unchanged.
        let (plan, actual) = month_pair(
            3,
            |p| {
                p.total_revenue = 100_000.0;
                p.new_customers = 100;
            },
            |a| {
                a.total_revenue = 60_000.0;
                a.new_customers = 60;
            },
        );
        let periods = run(plan, actual);
        assert!(periods[0]
            .primary_causes
            .contains(&RootCause::CustomerAcquisitionShortfall));
    }

    #[test]
    fn burn_up_revenue_down_is_flagged() {
        let (plan, actual) = month_pair(
            4,
            |p| {
                p.total_revenue = 100_000.0;
                p.burn_rate = 50_000.0;
            },
            |a| {
                a.total_revenue = 60_000.0;
                a.burn_rate = 80_000.0;
            },
        );
        let periods = run(plan, actual);
        assert!(periods[0]
            .primary_causes
            .contains(&RootCause::CostsUpRevenueDown));
    }

    #[test]
    fn seasonal_month_with_revenue_miss_names_seasonality() {
        let (plan, actual) = month_pair(
            7,
            |p| p.total_revenue = 100_000.0,
            |a| a.total_revenue = 60_000.0,
        );
        let periods = run(plan, actual);
        assert!(periods[0]
            .external_factors
            .contains(&ExternalFactor::SeasonalSlowdown));

        // Same miss outside the low season carries no seasonal factor.
        let (plan, actual) = month_pair(
            3,
            |p| p.total_revenue = 100_000.0,
            |a| a.total_revenue = 60_000.0,
        );
        let periods = run(plan, actual);
        assert!(!periods[0]
            .external_factors
            .contains(&ExternalFactor::SeasonalSlowdown));
    }

    #[test]
    fn churn_spike_over_two_points_is_external() {
        let (plan, actual) = month_pair(
            5,
            |p| {
                p.total_revenue = 100_000.0;
                p.churn_rate = 0.02;
            },
            |a| {
                a.total_revenue = 60_000.0;
                a.churn_rate = 0.05;
            },
        );
        let periods = run(plan, actual);
        assert!(periods[0]
            .external_factors
            .contains(&ExternalFactor::ChurnSpike));
    }

    #[test]
    fn insignificant_months_produce_no_periods() {
        let (plan, actual) = month_pair(
            2,
            |p| p.total_revenue = 100_000.0,
            |a| a.total_revenue = 101_000.0,
        );
        assert!(run(plan, actual).is_empty());
    }

    #[test]
    fn most_critical_picks_highest_severity() {
        let (plan, actual) = month_pair(
            6,
            |p| {
                p.total_revenue = 100_000.0;
                p.burn_rate = 50_000.0;
            },
            |a| {
                // Revenue -50% is critical, burn +15% over is medium.
                a.total_revenue = 50_000.0;
                a.burn_rate = 57_500.0;
            },
        );
        let periods = run(plan, actual);
        assert_eq!(periods[0].most_critical.significance, Significance::Critical);
    }
}
