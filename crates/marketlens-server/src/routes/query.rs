use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;

use marketlens_core::filter::{DateRange, DatasetFilter};
use marketlens_core::record::Platform;

use crate::error::AppError;

/// Filter parameters shared by every dataset read.
///
/// `platforms` and `states` are comma-separated lists; an absent or empty
/// list means "no restriction". A single date bound leaves the other side
/// open.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub platforms: Option<String>,
    pub states: Option<String>,
}

impl ViewQuery {
    pub fn to_filter(&self) -> Result<DatasetFilter, AppError> {
        let start = parse_optional_date(self.start_date.as_deref(), "start_date")?;
        let end = parse_optional_date(self.end_date.as_deref(), "end_date")?;
        let date_range = match (start, end) {
            (None, None) => None,
            (start, end) => Some(DateRange::new(
                start.unwrap_or(NaiveDate::MIN),
                end.unwrap_or(NaiveDate::MAX),
            )?),
        };

        let platforms = split_list(self.platforms.as_deref())
            .map(Platform::from_str)
            .collect::<Result<BTreeSet<_>, _>>()?;
        let states = split_list(self.states.as_deref())
            .map(str::to_string)
            .collect();

        Ok(DatasetFilter {
            date_range,
            platforms,
            states,
        })
    }
}

pub(crate) fn parse_strict_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(format!("invalid {field} format, expected YYYY-MM-DD"))
    })
}

fn parse_optional_date(raw: Option<&str>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_strict_date(value, field).map(Some),
    }
}

pub(crate) fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub(crate) fn parse_limit(raw: Option<usize>, default: usize, max: usize) -> Result<usize, AppError> {
    let limit = raw.unwrap_or(default);
    if limit == 0 || limit > max {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {max}"
        )));
    }
    Ok(limit)
}
