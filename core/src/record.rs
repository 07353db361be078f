//! The monthly financial record, the engine's only input data model.
//!
//! Records arrive from the storage layer already persisted and typed;
//! `validate` enforces the structural invariants the engine relies on
//! (month range, non-negative costs/counts/cash). Burn rate is allowed
//! to be negative: that is a net-profitable month, not bad data.

use crate::{
    error::{EngineError, EngineResult},
    types::{Month, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Plan,
    Actual,
}

impl RecordKind {
    pub fn key(self) -> &'static str {
        match self {
            RecordKind::Plan => "plan",
            RecordKind::Actual => "actual",
        }
    }
}

/// One company-month of financial data, either planned or actual.
/// Plan and actual variants carry an identical shape so variance
/// computation is a straight field-by-field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFinancialRecord {
    pub year: Year,
    pub month: Month,
    pub kind: RecordKind,

    // Revenue
    pub mrr: f64,
    pub total_revenue: f64,
    pub new_customers: i64,
    pub churned_customers: i64,
    pub expansion_mrr: f64,

    // Costs
    pub total_costs: f64,
    pub marketing_spend: f64,
    #[serde(default)]
    pub category_costs: BTreeMap<String, f64>,

    // Derived
    pub burn_rate: f64,
    pub runway_months: f64,
    pub gross_margin: f64,
    pub cac: f64,
    pub ltv: f64,
    pub ltv_cac_ratio: f64,
    pub churn_rate: f64,

    pub cash_balance: f64,
}

impl MonthlyFinancialRecord {
    /// Zero-valued record for the given period. Callers fill in the
    /// fields they have; absent metrics stay at zero and fall out of
    /// variance comparison via the zero/zero skip rule.
    pub fn new(kind: RecordKind, year: Year, month: Month) -> Self {
        Self {
            year,
            month,
            kind,
            mrr: 0.0,
            total_revenue: 0.0,
            new_customers: 0,
            churned_customers: 0,
            expansion_mrr: 0.0,
            total_costs: 0.0,
            marketing_spend: 0.0,
            category_costs: BTreeMap::new(),
            burn_rate: 0.0,
            runway_months: 0.0,
            gross_margin: 0.0,
            cac: 0.0,
            ltv: 0.0,
            ltv_cac_ratio: 0.0,
            churn_rate: 0.0,
            cash_balance: 0.0,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(EngineError::MonthOutOfRange {
                year: self.year,
                month: self.month,
            });
        }
        let non_negative: [(&'static str, f64); 5] = [
            ("total_costs", self.total_costs),
            ("marketing_spend", self.marketing_spend),
            ("new_customers", self.new_customers as f64),
            ("churned_customers", self.churned_customers as f64),
            ("cash_balance", self.cash_balance),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(EngineError::NegativeValue { field, value });
            }
        }
        for (category, value) in &self.category_costs {
            if *value < 0.0 {
                log::warn!("negative category cost '{category}': {value}");
                return Err(EngineError::NegativeValue {
                    field: "category_costs",
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

/// High-level grouping of a metric, used for reporting and for the
/// execution-quality heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Revenue,
    Costs,
    Efficiency,
    Cash,
    Other,
}

impl MetricCategory {
    pub fn key(self) -> &'static str {
        match self {
            MetricCategory::Revenue => "revenue",
            MetricCategory::Costs => "costs",
            MetricCategory::Efficiency => "efficiency",
            MetricCategory::Cash => "cash",
            MetricCategory::Other => "other",
        }
    }
}

/// Threshold class of a metric. Each class carries its own base
/// variance threshold in the config table; classes are coarser than
/// metrics because e.g. all recurring-revenue metrics share one
/// tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdClass {
    Revenue,
    Customers,
    Cac,
    Churn,
    BurnRate,
    LtvCac,
    Runway,
    Other,
}

/// The comparable metrics of a monthly record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalRevenue,
    Mrr,
    NewCustomers,
    ExpansionMrr,
    TotalCosts,
    MarketingSpend,
    GrossMargin,
    Cac,
    LtvCacRatio,
    ChurnRate,
    BurnRate,
    RunwayMonths,
    CashBalance,
}

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::TotalRevenue,
        Metric::Mrr,
        Metric::NewCustomers,
        Metric::ExpansionMrr,
        Metric::TotalCosts,
        Metric::MarketingSpend,
        Metric::GrossMargin,
        Metric::Cac,
        Metric::LtvCacRatio,
        Metric::ChurnRate,
        Metric::BurnRate,
        Metric::RunwayMonths,
        Metric::CashBalance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::TotalRevenue => "total_revenue",
            Metric::Mrr => "mrr",
            Metric::NewCustomers => "new_customers",
            Metric::ExpansionMrr => "expansion_mrr",
            Metric::TotalCosts => "total_costs",
            Metric::MarketingSpend => "marketing_spend",
            Metric::GrossMargin => "gross_margin",
            Metric::Cac => "cac",
            Metric::LtvCacRatio => "ltv_cac_ratio",
            Metric::ChurnRate => "churn_rate",
            Metric::BurnRate => "burn_rate",
            Metric::RunwayMonths => "runway_months",
            Metric::CashBalance => "cash_balance",
        }
    }

    pub fn category(self) -> MetricCategory {
        match self {
            Metric::TotalRevenue | Metric::Mrr | Metric::NewCustomers | Metric::ExpansionMrr => {
                MetricCategory::Revenue
            }
            Metric::TotalCosts | Metric::MarketingSpend => MetricCategory::Costs,
            Metric::GrossMargin | Metric::Cac | Metric::LtvCacRatio | Metric::ChurnRate => {
                MetricCategory::Efficiency
            }
            Metric::BurnRate | Metric::RunwayMonths | Metric::CashBalance => MetricCategory::Cash,
        }
    }

    pub fn threshold_class(self) -> ThresholdClass {
        match self {
            Metric::TotalRevenue | Metric::Mrr | Metric::ExpansionMrr => ThresholdClass::Revenue,
            Metric::NewCustomers => ThresholdClass::Customers,
            Metric::Cac => ThresholdClass::Cac,
            Metric::ChurnRate => ThresholdClass::Churn,
            Metric::BurnRate => ThresholdClass::BurnRate,
            Metric::GrossMargin | Metric::LtvCacRatio => ThresholdClass::LtvCac,
            Metric::RunwayMonths => ThresholdClass::Runway,
            Metric::MarketingSpend | Metric::TotalCosts | Metric::CashBalance => {
                ThresholdClass::Other
            }
        }
    }

    pub fn value_in(self, record: &MonthlyFinancialRecord) -> f64 {
        match self {
            Metric::TotalRevenue => record.total_revenue,
            Metric::Mrr => record.mrr,
            Metric::NewCustomers => record.new_customers as f64,
            Metric::ExpansionMrr => record.expansion_mrr,
            Metric::TotalCosts => record.total_costs,
            Metric::MarketingSpend => record.marketing_spend,
            Metric::GrossMargin => record.gross_margin,
            Metric::Cac => record.cac,
            Metric::LtvCacRatio => record.ltv_cac_ratio,
            Metric::ChurnRate => record.churn_rate,
            Metric::BurnRate => record.burn_rate,
            Metric::RunwayMonths => record.runway_months,
            Metric::CashBalance => record.cash_balance,
        }
    }
}
