//! Sidebar filters applied before aggregation.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::record::{BusinessDayRecord, Platform, RawAdRecord};

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(CoreError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Date, platform and state predicates.
///
/// An empty platform or state set passes everything, matching the dashboard
/// default of all values selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetFilter {
    pub date_range: Option<DateRange>,
    pub platforms: BTreeSet<Platform>,
    pub states: BTreeSet<String>,
}

impl DatasetFilter {
    pub fn is_pass_through(&self) -> bool {
        self.date_range.is_none() && self.platforms.is_empty() && self.states.is_empty()
    }

    fn matches_date(&self, date: NaiveDate) -> bool {
        self.date_range.map_or(true, |range| range.contains(date))
    }

    pub fn matches_ad(&self, record: &RawAdRecord) -> bool {
        self.matches_date(record.date)
            && (self.platforms.is_empty() || self.platforms.contains(&record.platform))
            && (self.states.is_empty() || self.states.contains(&record.state))
    }

    /// Business rows only carry a date, so only the date predicate applies.
    pub fn matches_business(&self, record: &BusinessDayRecord) -> bool {
        self.matches_date(record.date)
    }

    pub fn apply_ads(&self, records: &[RawAdRecord]) -> Vec<RawAdRecord> {
        records
            .iter()
            .filter(|r| self.matches_ad(r))
            .cloned()
            .collect()
    }

    pub fn apply_business(&self, records: &[BusinessDayRecord]) -> Vec<BusinessDayRecord> {
        records
            .iter()
            .filter(|r| self.matches_business(r))
            .cloned()
            .collect()
    }
}
