//! Financial forecasting and variance engine.
//!
//! Two analyses over a startup's monthly numbers: cash runway
//! projection (basic, growth-adjusted, scenarios, sensitivity,
//! fundraising timing) and plan-vs-actual variance analysis
//! (significance classification, root causes, accuracy trends).
//! All entry points are pure given their inputs; time is passed in
//! explicitly and config tables are injected.

pub mod cache;
pub mod categorizer;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod fundraising;
pub mod insight;
pub mod projection;
pub mod record;
pub mod root_cause;
pub mod scenario;
pub mod sensitivity;
pub mod significance;
pub mod trend;
pub mod types;
pub mod variance;

pub use engine::{ForecastEngine, RunwayAnalysis, VarianceReport};
pub use error::{EngineError, EngineResult};
