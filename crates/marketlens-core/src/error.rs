use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("end_date {end} must be on or after start_date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("duplicate business record for {0}")]
    DuplicateBusinessDate(NaiveDate),

    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("unknown dimension: {0} (expected one of date, platform, tactic, state, campaign)")]
    UnknownDimension(String),

    #[error("unknown metric: {0}")]
    UnknownMetric(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
