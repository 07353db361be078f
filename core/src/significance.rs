//! Significance classifier: stage-aware severity tiers for variances.
//!
//! The scaled threshold is T = base(threshold class) x stage
//! multiplier. |variance%| > 2T is critical, > 1.5T high, > T medium,
//! else low. Two directional overrides exist on top of the percentage
//! bands: a runway drop of more than 3 months always escalates, and a
//! burn increase is never classified below medium.

use crate::{
    config::EngineConfig,
    record::{Metric, ThresholdClass},
    types::CompanyStage,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Low,
    Medium,
    High,
    Critical,
}

impl Significance {
    pub fn is_significant(self) -> bool {
        self >= Significance::Medium
    }
}

/// Stage-scaled variance threshold for a threshold class, in percent.
pub fn scaled_threshold_percent(
    class: ThresholdClass,
    stage: CompanyStage,
    config: &EngineConfig,
) -> f64 {
    let base = config
        .variance_thresholds
        .get(&class)
        .copied()
        .unwrap_or(0.20);
    let multiplier = config
        .stage_multipliers
        .get(&stage)
        .copied()
        .unwrap_or(1.0);
    base * multiplier * 100.0
}

pub fn classify(
    metric: Metric,
    variance_amount: f64,
    variance_percent: f64,
    stage: CompanyStage,
    config: &EngineConfig,
) -> Significance {
    let t = scaled_threshold_percent(metric.threshold_class(), stage, config);
    let abs = variance_percent.abs();

    let mut significance = if abs > 2.0 * t {
        Significance::Critical
    } else if abs > 1.5 * t {
        Significance::High
    } else if abs > t {
        Significance::Medium
    } else {
        Significance::Low
    };

    // A runway drop of more than 3 months is escalated regardless of
    // how small it looks in percentage terms.
    if metric.threshold_class() == ThresholdClass::Runway && variance_amount < -3.0 {
        let escalated = if abs > 30.0 {
            Significance::Critical
        } else {
            Significance::High
        };
        significance = significance.max(escalated);
    }

    // Burning more than planned is never dismissed as low.
    if metric.threshold_class() == ThresholdClass::BurnRate && variance_amount > 0.0 {
        significance = significance.max(Significance::Medium);
    }

    significance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revenue_thirty_percent_at_series_a_is_critical() {
        // T = 10% x 1.1 = 11%; 30% > 2T = 22%.
        let config = EngineConfig::default();
        let sig = classify(
            Metric::TotalRevenue,
            30_000.0,
            30.0,
            CompanyStage::SeriesA,
            &config,
        );
        assert_eq!(sig, Significance::Critical);
        assert!(sig >= Significance::High);
    }

    #[test]
    fn pre_seed_tolerates_wider_revenue_misses() {
        // T = 10% x 1.5 = 15%: a 10% miss is still low at pre-seed but
        // medium at mature (T = 8%, 1.5T = 12%).
        let config = EngineConfig::default();
        assert_eq!(
            classify(Metric::TotalRevenue, -10_000.0, -10.0, CompanyStage::PreSeed, &config),
            Significance::Low
        );
        assert_eq!(
            classify(Metric::TotalRevenue, -10_000.0, -10.0, CompanyStage::Mature, &config),
            Significance::Medium
        );
    }

    #[test]
    fn runway_drop_over_three_months_escalates() {
        let config = EngineConfig::default();
        // -4 months on a 20-month runway plan: only -20%, under the
        // scaled threshold at pre-seed (25% x 1.5), but the drop rule
        // forces high.
        let sig = classify(
            Metric::RunwayMonths,
            -4.0,
            -20.0,
            CompanyStage::PreSeed,
            &config,
        );
        assert_eq!(sig, Significance::High);

        // Same drop rule at >30% becomes critical.
        let sig = classify(
            Metric::RunwayMonths,
            -5.0,
            -45.0,
            CompanyStage::PreSeed,
            &config,
        );
        assert_eq!(sig, Significance::Critical);
    }

    #[test]
    fn burn_increase_is_at_least_medium() {
        let config = EngineConfig::default();
        // +5% burn at series_b: T = 20%, percentage says low.
        let sig = classify(
            Metric::BurnRate,
            5_000.0,
            5.0,
            CompanyStage::SeriesB,
            &config,
        );
        assert_eq!(sig, Significance::Medium);

        // A burn decrease of the same size stays low.
        let sig = classify(
            Metric::BurnRate,
            -5_000.0,
            -5.0,
            CompanyStage::SeriesB,
            &config,
        );
        assert_eq!(sig, Significance::Low);
    }

    #[test]
    fn only_medium_and_above_are_significant() {
        assert!(!Significance::Low.is_significant());
        assert!(Significance::Medium.is_significant());
        assert!(Significance::Critical.is_significant());
    }
}
