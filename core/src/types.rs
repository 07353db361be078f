//! Shared primitive types used across the entire engine.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Calendar year of a monthly record.
pub type Year = i32;

/// Calendar month, 1..=12.
pub type Month = u32;

/// Stable identifier for a company, assigned by the storage layer.
pub type CompanyId = String;

/// A runway duration: a finite number of months, or no cash-out at all.
///
/// `Infinite` compares greater than any finite duration.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunwayMonths {
    Finite(f64),
    Infinite,
}

impl RunwayMonths {
    pub fn is_infinite(self) -> bool {
        matches!(self, RunwayMonths::Infinite)
    }

    pub fn finite(self) -> Option<f64> {
        match self {
            RunwayMonths::Finite(m) => Some(m),
            RunwayMonths::Infinite => None,
        }
    }

    /// Months as f64 with `Infinite` capped at `cap`. Keeps delta
    /// arithmetic finite in sensitivity and scenario comparisons.
    pub fn capped(self, cap: f64) -> f64 {
        match self {
            RunwayMonths::Finite(m) => m.min(cap),
            RunwayMonths::Infinite => cap,
        }
    }
}

/// Funding stage of the company under analysis. Earlier stages are
/// expected to deviate more from plan without it being alarming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStage {
    PreSeed,
    Seed,
    SeriesA,
    SeriesB,
    Growth,
    Mature,
}

impl CompanyStage {
    pub const ALL: [CompanyStage; 6] = [
        CompanyStage::PreSeed,
        CompanyStage::Seed,
        CompanyStage::SeriesA,
        CompanyStage::SeriesB,
        CompanyStage::Growth,
        CompanyStage::Mature,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CompanyStage::PreSeed => "pre_seed",
            CompanyStage::Seed => "seed",
            CompanyStage::SeriesA => "series_a",
            CompanyStage::SeriesB => "series_b",
            CompanyStage::Growth => "growth",
            CompanyStage::Mature => "mature",
        }
    }

    /// Parse a stage key. Unknown keys are an input error, never a
    /// silent default.
    pub fn parse(s: &str) -> EngineResult<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.key() == s)
            .ok_or_else(|| EngineError::UnknownStage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_parse_roundtrip() {
        for stage in CompanyStage::ALL {
            assert_eq!(CompanyStage::parse(stage.key()).unwrap(), stage);
        }
    }

    #[test]
    fn stage_parse_rejects_unknown_key() {
        assert!(matches!(
            CompanyStage::parse("series_z"),
            Err(EngineError::UnknownStage(_))
        ));
    }

    #[test]
    fn infinite_runway_orders_above_any_finite() {
        assert!(RunwayMonths::Infinite > RunwayMonths::Finite(1e9));
        assert!(RunwayMonths::Finite(6.0) > RunwayMonths::Finite(3.0));
    }

    #[test]
    fn capped_months() {
        assert_eq!(RunwayMonths::Infinite.capped(120.0), 120.0);
        assert_eq!(RunwayMonths::Finite(6.5).capped(120.0), 6.5);
        assert_eq!(RunwayMonths::Finite(500.0).capped(120.0), 120.0);
    }
}
