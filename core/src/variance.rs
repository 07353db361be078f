//! Variance calculator: plan vs actual, metric by metric.
//!
//! RULES:
//!   - Plan and actual records are aligned by (year, month); months
//!     present on only one side are dropped from the comparison.
//!   - Duplicate periods within either side are an error, not a
//!     silent overwrite.
//!   - variance = actual - planned; variance% = variance / planned x
//!     100. A positive actual against a zero plan reports 100%; a
//!     metric that is zero on both sides is skipped.

use crate::{
    config::EngineConfig,
    error::{EngineError, EngineResult},
    record::{Metric, MonthlyFinancialRecord, RecordKind},
    significance::{classify, Significance},
    types::{CompanyStage, Month, Year},
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    /// Every month on either side matched a counterpart.
    Complete,
    /// At least one month existed on only one side.
    Partial,
    /// No month was present on both sides.
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct AlignedMonth<'a> {
    pub year: Year,
    pub month: Month,
    pub planned: &'a MonthlyFinancialRecord,
    pub actual: &'a MonthlyFinancialRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceRecord {
    pub year: Year,
    pub month: Month,
    pub metric: Metric,
    pub category: crate::record::MetricCategory,
    pub planned: f64,
    pub actual: f64,
    pub variance_amount: f64,
    pub variance_percent: f64,
    pub significance: Significance,
}

fn index_by_period(
    records: &[MonthlyFinancialRecord],
    kind: RecordKind,
) -> EngineResult<BTreeMap<(Year, Month), &MonthlyFinancialRecord>> {
    let mut by_period = BTreeMap::new();
    for record in records {
        if by_period.insert((record.year, record.month), record).is_some() {
            return Err(EngineError::DuplicatePeriod {
                kind: kind.key(),
                year: record.year,
                month: record.month,
            });
        }
    }
    Ok(by_period)
}

/// Inner-join plan and actual records on (year, month).
pub fn align<'a>(
    planned: &'a [MonthlyFinancialRecord],
    actual: &'a [MonthlyFinancialRecord],
) -> EngineResult<(Vec<AlignedMonth<'a>>, AlignmentStatus)> {
    let plan_index = index_by_period(planned, RecordKind::Plan)?;
    let actual_index = index_by_period(actual, RecordKind::Actual)?;

    let mut aligned = Vec::new();
    for (&(year, month), &plan) in &plan_index {
        if let Some(&act) = actual_index.get(&(year, month)) {
            aligned.push(AlignedMonth {
                year,
                month,
                planned: plan,
                actual: act,
            });
        }
    }

    let status = if aligned.is_empty() {
        AlignmentStatus::Empty
    } else if aligned.len() == plan_index.len() && aligned.len() == actual_index.len() {
        AlignmentStatus::Complete
    } else {
        AlignmentStatus::Partial
    };
    Ok((aligned, status))
}

/// Per-metric variance percent with the zero-plan conventions applied.
/// Returns None when the metric should be skipped entirely.
fn variance_percent(planned: f64, actual: f64) -> Option<f64> {
    if planned == 0.0 && actual == 0.0 {
        return None;
    }
    if planned == 0.0 {
        return Some(if actual > 0.0 { 100.0 } else { 0.0 });
    }
    Some((actual - planned) / planned.abs() * 100.0)
}

/// Compute variance records for every aligned month and tracked metric.
pub fn compute(
    aligned: &[AlignedMonth<'_>],
    stage: CompanyStage,
    config: &EngineConfig,
) -> Vec<VarianceRecord> {
    let mut records = Vec::new();
    for pair in aligned {
        for metric in Metric::ALL {
            let planned = metric.value_in(pair.planned);
            let actual = metric.value_in(pair.actual);
            let Some(percent) = variance_percent(planned, actual) else {
                continue;
            };
            let amount = actual - planned;
            let significance = classify(metric, amount, percent, stage, config);
            records.push(VarianceRecord {
                year: pair.year,
                month: pair.month,
                metric,
                category: metric.category(),
                planned,
                actual,
                variance_amount: amount,
                variance_percent: percent,
                significance,
            });
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: RecordKind, year: Year, month: Month, revenue: f64) -> MonthlyFinancialRecord {
        let mut r = MonthlyFinancialRecord::new(kind, year, month);
        r.total_revenue = revenue;
        r
    }

    #[test]
    fn revenue_beat_is_measured_against_plan() {
        let plan = vec![record(RecordKind::Plan, 2025, 1, 100_000.0)];
        let actual = vec![record(RecordKind::Actual, 2025, 1, 130_000.0)];
        let (aligned, status) = align(&plan, &actual).unwrap();
        assert_eq!(status, AlignmentStatus::Complete);

        let records = compute(&aligned, CompanyStage::SeriesA, &EngineConfig::default());
        let revenue = records
            .iter()
            .find(|r| r.metric == Metric::TotalRevenue)
            .unwrap();
        assert_eq!(revenue.variance_amount, 30_000.0);
        assert!((revenue.variance_percent - 30.0).abs() < 1e-9);
        assert!(revenue.significance >= Significance::High);
    }

    #[test]
    fn zero_plan_with_actual_reports_hundred_percent() {
        let plan = vec![record(RecordKind::Plan, 2025, 1, 0.0)];
        let actual = vec![record(RecordKind::Actual, 2025, 1, 500.0)];
        let (aligned, _) = align(&plan, &actual).unwrap();
        let records = compute(&aligned, CompanyStage::Seed, &EngineConfig::default());
        let revenue = records
            .iter()
            .find(|r| r.metric == Metric::TotalRevenue)
            .unwrap();
        assert_eq!(revenue.variance_percent, 100.0);
        assert_eq!(revenue.variance_amount, 500.0);
    }

    #[test]
    fn metric_zero_on_both_sides_is_skipped() {
        let plan = vec![record(RecordKind::Plan, 2025, 1, 0.0)];
        let actual = vec![record(RecordKind::Actual, 2025, 1, 0.0)];
        let (aligned, _) = align(&plan, &actual).unwrap();
        let records = compute(&aligned, CompanyStage::Seed, &EngineConfig::default());
        assert!(records.iter().all(|r| r.metric != Metric::TotalRevenue));
    }

    #[test]
    fn months_without_a_counterpart_are_dropped() {
        let plan = vec![
            record(RecordKind::Plan, 2025, 1, 10_000.0),
            record(RecordKind::Plan, 2025, 2, 11_000.0),
        ];
        let actual = vec![record(RecordKind::Actual, 2025, 1, 9_000.0)];
        let (aligned, status) = align(&plan, &actual).unwrap();
        assert_eq!(aligned.len(), 1);
        assert_eq!(status, AlignmentStatus::Partial);
        assert_eq!(aligned[0].month, 1);
    }

    #[test]
    fn no_overlap_yields_empty_status() {
        let plan = vec![record(RecordKind::Plan, 2025, 1, 10_000.0)];
        let actual = vec![record(RecordKind::Actual, 2025, 2, 9_000.0)];
        let (aligned, status) = align(&plan, &actual).unwrap();
        assert!(aligned.is_empty());
        assert_eq!(status, AlignmentStatus::Empty);
    }

    #[test]
    fn duplicate_period_is_rejected() {
        let plan = vec![
            record(RecordKind::Plan, 2025, 1, 10_000.0),
            record(RecordKind::Plan, 2025, 1, 12_000.0),
        ];
        let actual = vec![record(RecordKind::Actual, 2025, 1, 9_000.0)];
        let err = align(&plan, &actual).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DuplicatePeriod { kind: "plan", year: 2025, month: 1 }
        ));
    }

    #[test]
    fn negative_planned_uses_absolute_base() {
        // Burn can legitimately be negative (cash-flow positive plan).
        let mut plan = record(RecordKind::Plan, 2025, 1, 0.0);
        plan.burn_rate = -10_000.0;
        let mut actual = record(RecordKind::Actual, 2025, 1, 0.0);
        actual.burn_rate = -5_000.0;
        let plans = [plan];
        let actuals = [actual];
        let (aligned, _) = align(&plans, &actuals).unwrap();
        let records = compute(&aligned, CompanyStage::Seed, &EngineConfig::default());
        let burn = records.iter().find(|r| r.metric == Metric::BurnRate).unwrap();
        assert_eq!(burn.variance_amount, 5_000.0);
        assert!((burn.variance_percent - 50.0).abs() < 1e-9);
    }
}
