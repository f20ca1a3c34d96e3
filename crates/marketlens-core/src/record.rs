//! Normalized input records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::metrics::DerivedMetrics;

/// Advertising platform a record was exported from.
///
/// The variant order is the concatenation order of the platform sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    Facebook,
    Google,
    TikTok,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Facebook, Platform::Google, Platform::TikTok];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Google => "Google",
            Platform::TikTok => "TikTok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    /// Case-insensitive so query strings like `platforms=tiktok` work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "google" => Ok(Platform::Google),
            "tiktok" => Ok(Platform::TikTok),
            _ => Err(CoreError::UnknownPlatform(s.to_string())),
        }
    }
}

/// One row of a platform's ad export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAdRecord {
    pub date: NaiveDate,
    pub platform: Platform,
    pub tactic: String,
    pub state: String,
    pub campaign: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub attributed_revenue: f64,
}

impl RawAdRecord {
    /// Row-level ratios for this record alone.
    pub fn metrics(&self) -> DerivedMetrics {
        DerivedMetrics::derive(
            self.impressions,
            self.clicks,
            self.spend,
            self.attributed_revenue,
        )
    }
}

/// One day of business totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessDayRecord {
    pub date: NaiveDate,
    pub order_count: u64,
    pub new_customers: u64,
    pub total_revenue: f64,
    pub gross_profit: f64,
}

/// A row of the unified ad-performance table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdPerformanceRow {
    #[serde(flatten)]
    pub record: RawAdRecord,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
}

/// Attach row-level metrics to each record, keeping order.
pub fn performance_table(records: &[RawAdRecord]) -> Vec<AdPerformanceRow> {
    records
        .iter()
        .map(|record| AdPerformanceRow {
            metrics: record.metrics(),
            record: record.clone(),
        })
        .collect()
}
