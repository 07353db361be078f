//! Fundraising timing calculator.
//!
//! optimal_start = current runway - process duration - safety buffer.
//! The checklist per urgency tier is a lookup table, not something
//! derived from the numbers.

use crate::{config::EngineConfig, projection, types::RunwayMonths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundraisingUrgency {
    /// The window has already closed; this is emergency fundraising.
    Late,
    Urgent,
    Soon,
    Planned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundraisingAdvice {
    pub current_runway: RunwayMonths,
    pub process_months: f64,
    pub buffer_months: f64,
    /// Months until fundraising should start, clamped at zero. Absent
    /// for an infinite runway.
    pub optimal_start_months: Option<f64>,
    pub urgency: FundraisingUrgency,
    pub recommended_action: &'static str,
    pub checklist: Vec<&'static str>,
    /// Latest sensible start date. Absent for an infinite runway.
    pub critical_date: Option<DateTime<Utc>>,
}

pub fn advise(
    runway: RunwayMonths,
    as_of: DateTime<Utc>,
    config: &EngineConfig,
) -> FundraisingAdvice {
    let fc = &config.fundraising;

    let RunwayMonths::Finite(months) = runway else {
        return FundraisingAdvice {
            current_runway: runway,
            process_months: fc.process_months,
            buffer_months: fc.buffer_months,
            optimal_start_months: None,
            urgency: FundraisingUrgency::Planned,
            recommended_action: FundraisingUrgency::Planned.action(),
            checklist: FundraisingUrgency::Planned.checklist(),
            critical_date: None,
        };
    };

    let start = months - fc.process_months - fc.buffer_months;
    let urgency = if start <= 0.0 {
        FundraisingUrgency::Late
    } else if start <= fc.urgent_cutoff_months {
        FundraisingUrgency::Urgent
    } else if start <= fc.soon_cutoff_months {
        FundraisingUrgency::Soon
    } else {
        FundraisingUrgency::Planned
    };

    FundraisingAdvice {
        current_runway: runway,
        process_months: fc.process_months,
        buffer_months: fc.buffer_months,
        optimal_start_months: Some(start.max(0.0)),
        urgency,
        recommended_action: urgency.action(),
        checklist: urgency.checklist(),
        critical_date: projection::cash_out_date(as_of, start.max(0.0), config),
    }
}

impl FundraisingUrgency {
    pub fn action(self) -> &'static str {
        match self {
            FundraisingUrgency::Late => "Start an emergency fundraising process immediately",
            FundraisingUrgency::Urgent => "Start the fundraising process this month",
            FundraisingUrgency::Soon => "Start preparation now, launch the process in 1-2 months",
            FundraisingUrgency::Planned => "Plan the raise, begin preparation a quarter ahead",
        }
    }

    /// Fixed ordered checklist per tier.
    pub fn checklist(self) -> Vec<&'static str> {
        match self {
            FundraisingUrgency::Late | FundraisingUrgency::Urgent => vec![
                "Prepare the pitch deck immediately",
                "Begin investor outreach",
                "Evaluate bridge financing options",
                "Cut spend to extend runway",
            ],
            FundraisingUrgency::Soon => vec![
                "Prepare the pitch deck within two weeks",
                "Build the target investor list",
                "Start building investor relationships",
                "Prepare the financial model",
            ],
            FundraisingUrgency::Planned => vec![
                "Begin preparing materials three months before launch",
                "Build relationships with investors",
                "Improve key metrics ahead of the raise",
                "Draft a detailed fundraising plan",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn urgency_for(months: f64) -> FundraisingUrgency {
        advise(
            RunwayMonths::Finite(months),
            as_of(),
            &EngineConfig::default(),
        )
        .urgency
    }

    #[test]
    fn urgency_tiers() {
        // optimal_start = runway - 6 - 3
        assert_eq!(urgency_for(2.0), FundraisingUrgency::Late); // -7
        assert_eq!(urgency_for(9.0), FundraisingUrgency::Late); // 0
        assert_eq!(urgency_for(10.0), FundraisingUrgency::Urgent); // 1
        assert_eq!(urgency_for(12.0), FundraisingUrgency::Urgent); // 3
        assert_eq!(urgency_for(14.0), FundraisingUrgency::Soon); // 5
        assert_eq!(urgency_for(20.0), FundraisingUrgency::Planned); // 11
    }

    #[test]
    fn late_start_is_clamped_to_zero() {
        let advice = advise(
            RunwayMonths::Finite(2.0),
            as_of(),
            &EngineConfig::default(),
        );
        assert_eq!(advice.optimal_start_months, Some(0.0));
        assert_eq!(advice.critical_date, Some(as_of()));
        assert!(!advice.checklist.is_empty());
    }

    #[test]
    fn infinite_runway_is_planned_without_dates() {
        let advice = advise(RunwayMonths::Infinite, as_of(), &EngineConfig::default());
        assert_eq!(advice.urgency, FundraisingUrgency::Planned);
        assert_eq!(advice.optimal_start_months, None);
        assert_eq!(advice.critical_date, None);
    }

    #[test]
    fn checklists_differ_by_tier() {
        assert_ne!(
            FundraisingUrgency::Urgent.checklist(),
            FundraisingUrgency::Planned.checklist()
        );
        assert_eq!(
            FundraisingUrgency::Late.checklist(),
            FundraisingUrgency::Urgent.checklist()
        );
    }
}
