use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("month {month} out of range 1..=12 in year {year}")]
    MonthOutOfRange { year: i32, month: u32 },

    #[error("{field} must be non-negative, got {value}")]
    NegativeValue { field: &'static str, value: f64 },

    #[error("unknown company stage '{0}'")]
    UnknownStage(String),

    #[error("duplicate {kind} record for {year}-{month:02}")]
    DuplicatePeriod {
        kind: &'static str,
        year: i32,
        month: u32,
    },

    #[error("growth rate {0} out of range, must be greater than -1.0")]
    InvalidGrowthRate(f64),

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
