//! Ratio derivation shared by row-level, group-level and day-level tables.
//!
//! Every ratio is `None` when its denominator is zero. Defined values are
//! rounded to two decimals, half away from zero.

use serde::{Deserialize, Serialize};

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator * scale`, rounded, or `None` for a zero denominator.
pub fn ratio(numerator: f64, denominator: f64, scale: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    Some(round2(numerator / denominator * scale))
}

/// Click-through rate in percent.
pub fn ctr(impressions: u64, clicks: u64) -> Option<f64> {
    ratio(clicks as f64, impressions as f64, 100.0)
}

/// Cost per click.
pub fn cpc(spend: f64, clicks: u64) -> Option<f64> {
    ratio(spend, clicks as f64, 1.0)
}

/// Cost per thousand impressions.
pub fn cpm(spend: f64, impressions: u64) -> Option<f64> {
    ratio(spend, impressions as f64, 1000.0)
}

/// Return on ad spend.
pub fn roas(attributed_revenue: f64, spend: f64) -> Option<f64> {
    ratio(attributed_revenue, spend, 1.0)
}

/// Attributed revenue per thousand impressions.
pub fn revenue_per_mille(attributed_revenue: f64, impressions: u64) -> Option<f64> {
    ratio(attributed_revenue, impressions as f64, 1000.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub ctr: Option<f64>,
    pub cpc: Option<f64>,
    pub cpm: Option<f64>,
    pub roas: Option<f64>,
}

impl DerivedMetrics {
    pub fn derive(impressions: u64, clicks: u64, spend: f64, attributed_revenue: f64) -> Self {
        Self {
            ctr: ctr(impressions, clicks),
            cpc: cpc(spend, clicks),
            cpm: cpm(spend, impressions),
            roas: roas(attributed_revenue, spend),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctr_with_no_impressions_is_undefined() {
        assert_eq!(ctr(0, 0), None);
    }

    #[test]
    fn cpc_with_no_clicks_is_undefined_for_any_spend() {
        for spend in [0.0, 0.01, 50.0, 1_000_000.0] {
            assert_eq!(cpc(spend, 0), None, "spend {spend}");
        }
    }

    #[test]
    fn zero_spend_makes_roas_undefined_but_not_cpc() {
        let metrics = DerivedMetrics::derive(1000, 10, 0.0, 25.0);
        assert_eq!(metrics.roas, None);
        assert_eq!(metrics.cpc, Some(0.0));
        assert_eq!(metrics.cpm, Some(0.0));
        assert_eq!(metrics.ctr, Some(1.0));
    }

    #[test]
    fn ratios_round_to_two_decimals() {
        assert_eq!(ctr(300, 40), Some(13.33));
        assert_eq!(roas(230.0, 150.0), Some(1.53));
        assert_eq!(cpm(150.0, 300), Some(500.0));
        assert_eq!(cpc(150.0, 40), Some(3.75));
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(2.5), 2.5);
    }

    #[test]
    fn clicks_above_impressions_is_not_an_error() {
        assert_eq!(ctr(10, 20), Some(200.0));
    }
}
