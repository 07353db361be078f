//! End-to-end variance analysis over a multi-month plan.

use chrono::{TimeZone, Utc};
use finplan_core::{
    insight::InsightKind,
    record::{Metric, MonthlyFinancialRecord, RecordKind},
    root_cause::ExternalFactor,
    significance::Significance,
    trend::{TrendDirection, TrendSummary},
    types::CompanyStage,
    variance::AlignmentStatus,
    ForecastEngine,
};

fn as_of() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()
}

fn plan_month(m: u32) -> MonthlyFinancialRecord {
    let mut r = MonthlyFinancialRecord::new(RecordKind::Plan, 2025, m);
    r.total_revenue = 100_000.0;
    r.total_costs = 80_000.0;
    r.burn_rate = 30_000.0;
    r.new_customers = 50;
    r
}

fn actual_month(m: u32, revenue: f64) -> MonthlyFinancialRecord {
    let mut r = MonthlyFinancialRecord::new(RecordKind::Actual, 2025, m);
    r.total_revenue = revenue;
    r.total_costs = 80_000.0;
    r.burn_rate = 30_000.0;
    r.new_customers = 50;
    r
}

/// Half a year of worsening revenue misses: the report should carry
/// the classified records, a worsening trend, the summer seasonality
/// factor in the root causes and the matching insights.
#[test]
fn worsening_revenue_misses_are_fully_explained() {
    let engine = ForecastEngine::with_defaults();
    let planned: Vec<_> = (1..=7).map(plan_month).collect();
    // Misses grow from 2% to 62% over seven months.
    let actuals: Vec<_> = (1..=7)
        .map(|m| actual_month(m, 100_000.0 - f64::from(m) * 10_000.0 + 8_000.0))
        .collect();

    let report = engine
        .analyze_variance(&planned, &actuals, CompanyStage::SeriesA, as_of())
        .unwrap();

    assert_eq!(report.alignment, AlignmentStatus::Complete);
    assert_eq!(report.aligned_months, 7);

    // Month 1 misses by 2%, under every threshold.
    assert!(!report
        .significant
        .iter()
        .any(|v| v.year == 2025 && v.month == 1));
    // Month 7 misses by 62%, critical for revenue at series A.
    let worst = report
        .significant
        .iter()
        .find(|v| v.month == 7 && v.metric == Metric::TotalRevenue)
        .unwrap();
    assert_eq!(worst.significance, Significance::Critical);
    assert!((worst.variance_percent - -62.0).abs() < 1e-9);

    let TrendSummary::Computed(trend) = &report.trend else {
        panic!("seven aligned months must produce a trend");
    };
    assert_eq!(trend.direction, TrendDirection::Worsening);
    assert_eq!(trend.monthly.len(), 7);

    // July's revenue miss picks up the seasonal factor; June's does not.
    let july = report.root_causes.iter().find(|p| p.month == 7).unwrap();
    assert!(july.external_factors.contains(&ExternalFactor::SeasonalSlowdown));
    let june = report.root_causes.iter().find(|p| p.month == 6).unwrap();
    assert!(!june.external_factors.contains(&ExternalFactor::SeasonalSlowdown));

    assert!(report
        .insights
        .iter()
        .any(|i| i.kind == InsightKind::CriticalVariances));
    assert!(report
        .insights
        .iter()
        .any(|i| i.kind == InsightKind::WorseningAccuracy));

    let summary = report.summary.unwrap();
    assert_eq!(summary.worst_metrics[0].metric, Metric::TotalRevenue);
    // Costs, burn and customers came in exactly on plan.
    assert_eq!(
        summary.best_metrics[0].avg_abs_variance_percent,
        0.0
    );
}

/// Duplicate months in the actuals are a hard error, not a silent
/// last-writer-wins merge.
#[test]
fn duplicate_actual_months_are_rejected() {
    let engine = ForecastEngine::with_defaults();
    let planned = vec![plan_month(1)];
    let actuals = vec![actual_month(1, 90_000.0), actual_month(1, 95_000.0)];

    let err = engine
        .analyze_variance(&planned, &actuals, CompanyStage::Seed, as_of())
        .unwrap_err();
    assert!(matches!(
        err,
        finplan_core::EngineError::DuplicatePeriod { kind: "actual", year: 2025, month: 1 }
    ));
}

/// With no overlapping months there is nothing to analyze, but the
/// report still says so explicitly instead of failing.
#[test]
fn disjoint_periods_produce_an_empty_report() {
    let engine = ForecastEngine::with_defaults();
    let planned = vec![plan_month(1)];
    let actuals = vec![actual_month(2, 90_000.0)];

    let report = engine
        .analyze_variance(&planned, &actuals, CompanyStage::Seed, as_of())
        .unwrap();
    assert_eq!(report.alignment, AlignmentStatus::Empty);
    assert!(report.variances.is_empty());
    assert!(report.summary.is_none());
    assert!(report.root_causes.is_empty());
    assert!(matches!(
        report.trend,
        TrendSummary::InsufficientData { months_available: 0, .. }
    ));
}
