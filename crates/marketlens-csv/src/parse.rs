//! Cell parsers for the source exports.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a calendar date. Timestamps keep only their date part.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Largest integer an `f64` holds exactly.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Parse a non-negative count. Integral decimals such as `1200.0` are
/// accepted because spreadsheet exports write counts that way. Out-of-range
/// values are rejected, never clamped.
pub fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<u64>() {
        return Some(value);
    }
    if let Some((int, frac)) = raw.split_once('.') {
        if !frac.contains(['e', 'E']) {
            if int.is_empty() || !frac.bytes().all(|b| b == b'0') {
                return None;
            }
            return int.parse::<u64>().ok();
        }
    }
    if !raw.contains(['e', 'E']) {
        return None;
    }
    // Exponent notation only goes through f64, so stay within its exact range.
    let value = raw.parse::<f64>().ok()?;
    if value >= 0.0 && value.fract() == 0.0 && value <= MAX_EXACT_FLOAT {
        Some(value as u64)
    } else {
        None
    }
}

/// Parse a finite currency amount.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
