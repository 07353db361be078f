//! Runway categorizer: maps a runway duration to a severity bucket.
//!
//! Band boundaries come from the config table, not from literals here;
//! display concerns (color tokens, descriptions) hang off the category
//! as accessors so categorization itself stays display-free.

use crate::types::RunwayMonths;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunwayCategory {
    Infinite,
    Excellent,
    VeryGood,
    Good,
    Warning,
    Concerning,
    Critical,
    Emergency,
}

/// One band of the category table: any runway at or above `min_months`
/// (and below the previous band's bound) falls into `category`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBand {
    pub min_months: f64,
    pub category: RunwayCategory,
}

/// Categorize a runway duration against an ordered band table
/// (descending `min_months`). Net-positive cash flow is `Infinite`
/// regardless of the table; anything below every band is `Emergency`.
pub fn categorize(months: RunwayMonths, bands: &[CategoryBand]) -> RunwayCategory {
    match months {
        RunwayMonths::Infinite => RunwayCategory::Infinite,
        RunwayMonths::Finite(m) => bands
            .iter()
            .find(|band| m >= band.min_months)
            .map(|band| band.category)
            .unwrap_or(RunwayCategory::Emergency),
    }
}

impl RunwayCategory {
    pub fn key(self) -> &'static str {
        match self {
            RunwayCategory::Infinite => "infinite",
            RunwayCategory::Excellent => "excellent",
            RunwayCategory::VeryGood => "very_good",
            RunwayCategory::Good => "good",
            RunwayCategory::Warning => "warning",
            RunwayCategory::Concerning => "concerning",
            RunwayCategory::Critical => "critical",
            RunwayCategory::Emergency => "emergency",
        }
    }

    /// Color token for downstream display. Not used anywhere in the
    /// engine's own logic.
    pub fn color(self) -> &'static str {
        match self {
            RunwayCategory::Infinite => "green",
            RunwayCategory::Excellent => "green",
            RunwayCategory::VeryGood => "blue",
            RunwayCategory::Good => "lightblue",
            RunwayCategory::Warning => "yellow",
            RunwayCategory::Concerning => "orange",
            RunwayCategory::Critical => "red",
            RunwayCategory::Emergency => "darkred",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RunwayCategory::Infinite => "Positive cash flow, no cash-out date",
            RunwayCategory::Excellent => "More than 2 years of runway",
            RunwayCategory::VeryGood => "18-24 months of runway",
            RunwayCategory::Good => "12-18 months of runway, room to grow",
            RunwayCategory::Warning => "9-12 months, start planning fundraising",
            RunwayCategory::Concerning => "6-9 months, fundraising should be underway",
            RunwayCategory::Critical => "3-6 months, emergency measures needed",
            RunwayCategory::Emergency => "Under 3 months of runway",
        }
    }
}
