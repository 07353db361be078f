//! Forecast-accuracy trends over aligned plan and actual months.
//!
//! Each aligned month is collapsed into one aggregate variance figure:
//! the mean absolute variance percent over the key metrics (revenue,
//! costs, burn, new customers). An ordinary least squares fit over that
//! series gives the direction; a negative slope means forecasts are
//! getting more accurate.

use crate::{
    config::EngineConfig,
    record::Metric,
    types::{Month, Year},
    variance::AlignedMonth,
};
use serde::Serialize;

/// Metrics that feed the per-month aggregate variance.
pub const KEY_METRICS: &[Metric] = &[
    Metric::TotalRevenue,
    Metric::TotalCosts,
    Metric::BurnRate,
    Metric::NewCustomers,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyAggregateVariance {
    pub year: Year,
    pub month: Month,
    pub avg_variance_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub direction: TrendDirection,
    /// abs(slope) scaled to a 0-and-up strength figure.
    pub strength: f64,
    /// Population standard deviation of the monthly series.
    pub volatility: f64,
    pub avg_variance_percent: f64,
    /// Direction of the last three months only.
    pub recent: TrendDirection,
    pub monthly: Vec<MonthlyAggregateVariance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendSummary {
    InsufficientData {
        months_available: usize,
        months_required: usize,
    },
    Computed(TrendReport),
}

fn aggregate_variance(pair: &AlignedMonth<'_>) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0u32;
    for &metric in KEY_METRICS {
        let planned = metric.value_in(pair.planned);
        let actual = metric.value_in(pair.actual);
        if planned != 0.0 {
            total += (actual - planned).abs() / planned.abs();
            count += 1;
        }
    }
    (count > 0).then(|| total / f64::from(count) * 100.0)
}

/// OLS slope of y over x = 0..n.
fn slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn recent_direction(values: &[f64]) -> TrendDirection {
    let recent = &values[values.len() - 3..];
    if recent[0] > recent[1] && recent[1] > recent[2] {
        return TrendDirection::Improving;
    }
    if recent[0] < recent[1] && recent[1] < recent[2] {
        return TrendDirection::Worsening;
    }
    let avg_recent = recent.iter().sum::<f64>() / 3.0;
    let avg_previous = if values.len() > 3 {
        let previous = &values[..values.len() - 3];
        previous.iter().sum::<f64>() / previous.len() as f64
    } else {
        avg_recent
    };
    if avg_recent < avg_previous * 0.8 {
        TrendDirection::Improving
    } else if avg_recent > avg_previous * 1.2 {
        TrendDirection::Worsening
    } else {
        TrendDirection::Stable
    }
}

pub fn analyze(aligned: &[AlignedMonth<'_>], config: &EngineConfig) -> TrendSummary {
    let required = config.trend.min_months;
    let monthly: Vec<MonthlyAggregateVariance> = aligned
        .iter()
        .filter_map(|pair| {
            aggregate_variance(pair).map(|avg| MonthlyAggregateVariance {
                year: pair.year,
                month: pair.month,
                avg_variance_percent: avg,
            })
        })
        .collect();

    if monthly.len() < required {
        return TrendSummary::InsufficientData {
            months_available: monthly.len(),
            months_required: required,
        };
    }

    let values: Vec<f64> = monthly.iter().map(|m| m.avg_variance_percent).collect();
    let slope = slope(&values);
    let direction = if slope < config.trend.improving_slope_cutoff {
        TrendDirection::Improving
    } else if slope > config.trend.worsening_slope_cutoff {
        TrendDirection::Worsening
    } else {
        TrendDirection::Stable
    };

    TrendSummary::Computed(TrendReport {
        direction,
        strength: slope.abs() * 10.0,
        volatility: std_dev(&values),
        avg_variance_percent: values.iter().sum::<f64>() / values.len() as f64,
        recent: recent_direction(&values),
        monthly,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MonthlyFinancialRecord, RecordKind};
    use crate::variance;

    fn series(actual_revenues: &[f64]) -> (Vec<MonthlyFinancialRecord>, Vec<MonthlyFinancialRecord>) {
        let mut plans = Vec::new();
        let mut actuals = Vec::new();
        for (i, &revenue) in actual_revenues.iter().enumerate() {
            let month = i as Month + 1;
            let mut plan = MonthlyFinancialRecord::new(RecordKind::Plan, 2025, month);
            plan.total_revenue = 100_000.0;
            plans.push(plan);
            let mut actual = MonthlyFinancialRecord::new(RecordKind::Actual, 2025, month);
            actual.total_revenue = revenue;
            actuals.push(actual);
        }
        (plans, actuals)
    }

    fn run(actual_revenues: &[f64]) -> TrendSummary {
        let config = EngineConfig::default();
        let (plans, actuals) = series(actual_revenues);
        let (aligned, _) = variance::align(&plans, &actuals).unwrap();
        analyze(&aligned, &config)
    }

    #[test]
    fn two_months_is_insufficient() {
        let summary = run(&[90_000.0, 95_000.0]);
        assert!(matches!(
            summary,
            TrendSummary::InsufficientData { months_available: 2, months_required: 3 }
        ));
    }

    #[test]
    fn shrinking_misses_read_as_improving() {
        // Aggregate variance 30%, 20%, 10%, 0%: slope -10.
        let summary = run(&[70_000.0, 80_000.0, 90_000.0, 100_000.0]);
        let TrendSummary::Computed(report) = summary else {
            panic!("expected a computed trend");
        };
        assert_eq!(report.direction, TrendDirection::Improving);
        assert_eq!(report.recent, TrendDirection::Improving);
        assert!((report.strength - 100.0).abs() < 1e-9);
        assert!((report.avg_variance_percent - 15.0).abs() < 1e-9);
        assert_eq!(report.monthly.len(), 4);
    }

    #[test]
    fn growing_misses_read_as_worsening() {
        let summary = run(&[95_000.0, 85_000.0, 70_000.0]);
        let TrendSummary::Computed(report) = summary else {
            panic!("expected a computed trend");
        };
        assert_eq!(report.direction, TrendDirection::Worsening);
        assert_eq!(report.recent, TrendDirection::Worsening);
    }

    #[test]
    fn flat_misses_read_as_stable_with_zero_volatility() {
        let summary = run(&[90_000.0, 90_000.0, 90_000.0]);
        let TrendSummary::Computed(report) = summary else {
            panic!("expected a computed trend");
        };
        assert_eq!(report.direction, TrendDirection::Stable);
        assert_eq!(report.volatility, 0.0);
        assert!((report.avg_variance_percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_plan_months_are_excluded_from_the_series() {
        let config = EngineConfig::default();
        let (mut plans, actuals) = series(&[90_000.0, 90_000.0, 90_000.0, 90_000.0]);
        plans[0].total_revenue = 0.0;
        let (aligned, _) = variance::align(&plans, &actuals).unwrap();
        let TrendSummary::Computed(report) = analyze(&aligned, &config) else {
            panic!("expected a computed trend");
        };
        assert_eq!(report.monthly.len(), 3);
        assert_eq!(report.monthly[0].month, 2);
    }
}
