//! Left join of business days with daily marketing totals.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{aggregate, AggregatedGroup, Dimension};
use crate::metrics::{self, DerivedMetrics};
use crate::record::{BusinessDayRecord, RawAdRecord};

/// A business day with the marketing totals of the same date.
///
/// Marketing fields are `None` when the day has no ad data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedDayRecord {
    pub date: NaiveDate,
    pub order_count: u64,
    pub new_customers: u64,
    pub total_revenue: f64,
    pub gross_profit: f64,
    pub impressions: Option<u64>,
    pub clicks: Option<u64>,
    pub spend: Option<f64>,
    pub attributed_revenue: Option<f64>,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub avg_order_value: Option<f64>,
    pub customer_acquisition_cost: Option<f64>,
    pub marketing_attribution_rate: Option<f64>,
    pub profit_margin: Option<f64>,
}

#[derive(Default, Clone, Copy)]
struct DailyMarketing {
    impressions: u64,
    clicks: u64,
    spend: f64,
    attributed_revenue: f64,
}

fn combine(business: &BusinessDayRecord, marketing: Option<DailyMarketing>) -> CombinedDayRecord {
    let metrics = marketing
        .map(|m| DerivedMetrics::derive(m.impressions, m.clicks, m.spend, m.attributed_revenue))
        .unwrap_or_default();
    let customer_acquisition_cost =
        marketing.and_then(|m| metrics::ratio(m.spend, business.new_customers as f64, 1.0));
    let marketing_attribution_rate = marketing
        .and_then(|m| metrics::ratio(m.attributed_revenue, business.total_revenue, 100.0));

    CombinedDayRecord {
        date: business.date,
        order_count: business.order_count,
        new_customers: business.new_customers,
        total_revenue: business.total_revenue,
        gross_profit: business.gross_profit,
        impressions: marketing.map(|m| m.impressions),
        clicks: marketing.map(|m| m.clicks),
        spend: marketing.map(|m| m.spend),
        attributed_revenue: marketing.map(|m| m.attributed_revenue),
        metrics,
        avg_order_value: metrics::ratio(
            business.total_revenue,
            business.order_count as f64,
            1.0,
        ),
        customer_acquisition_cost,
        marketing_attribution_rate,
        profit_margin: metrics::ratio(business.gross_profit, business.total_revenue, 100.0),
    }
}

/// Left outer join on date.
///
/// Every business record yields exactly one output row, sorted by date
/// ascending. `daily_marketing` is expected to come from
/// `aggregate(records, &[Dimension::Date])`; several groups for one date are
/// summed and groups without a date key are ignored.
pub fn join(
    business: &[BusinessDayRecord],
    daily_marketing: &[AggregatedGroup],
) -> Vec<CombinedDayRecord> {
    let mut by_date: HashMap<NaiveDate, DailyMarketing> = HashMap::new();
    for group in daily_marketing {
        let Some(date) = group.key.date else {
            continue;
        };
        let entry = by_date.entry(date).or_default();
        entry.impressions = entry.impressions.saturating_add(group.impressions);
        entry.clicks = entry.clicks.saturating_add(group.clicks);
        entry.spend += group.spend;
        entry.attributed_revenue += group.attributed_revenue;
    }

    let mut combined: Vec<CombinedDayRecord> = business
        .iter()
        .map(|day| combine(day, by_date.get(&day.date).copied()))
        .collect();
    combined.sort_by_key(|row| row.date);
    combined
}

/// Aggregate `ads` by date and join them onto `business`.
pub fn combine_tables(
    business: &[BusinessDayRecord],
    ads: &[RawAdRecord],
) -> Vec<CombinedDayRecord> {
    join(business, &aggregate(ads, &[Dimension::Date]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Platform;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).expect("valid date")
    }

    fn business(d: u32, orders: u64, customers: u64, revenue: f64, profit: f64) -> BusinessDayRecord {
        BusinessDayRecord {
            date: day(d),
            order_count: orders,
            new_customers: customers,
            total_revenue: revenue,
            gross_profit: profit,
        }
    }

    fn ad(d: u32, platform: Platform, spend: f64, revenue: f64) -> RawAdRecord {
        RawAdRecord {
            date: day(d),
            platform,
            tactic: "Search".to_string(),
            state: "CA".to_string(),
            campaign: "Brand".to_string(),
            impressions: 1000,
            clicks: 50,
            spend,
            attributed_revenue: revenue,
        }
    }

    #[test]
    fn business_day_without_ads_keeps_marketing_undefined() {
        let rows = combine_tables(&[business(1, 10, 0, 1000.0, 0.0)], &[]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.total_revenue, 1000.0);
        assert_eq!(row.avg_order_value, Some(100.0));
        assert_eq!(row.attributed_revenue, None);
        assert_eq!(row.marketing_attribution_rate, None);
        assert_eq!(row.spend, None);
        assert_eq!(row.customer_acquisition_cost, None);
        assert_eq!(row.metrics, DerivedMetrics::default());
        assert_eq!(row.profit_margin, Some(0.0));
    }

    #[test]
    fn output_length_matches_business_rows() {
        let days = vec![
            business(3, 5, 1, 500.0, 100.0),
            business(1, 4, 2, 400.0, 80.0),
            business(2, 2, 0, 0.0, 0.0),
        ];
        let ads = vec![
            ad(1, Platform::Facebook, 10.0, 40.0),
            ad(1, Platform::Google, 30.0, 60.0),
            ad(9, Platform::TikTok, 5.0, 1.0),
            ad(10, Platform::TikTok, 5.0, 1.0),
        ];
        let rows = combine_tables(&days, &ads);
        assert_eq!(rows.len(), days.len());
        assert!(combine_tables(&days, &[]).len() == days.len());
        assert!(combine_tables(&[], &ads).is_empty());

        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn cross_domain_metrics_use_daily_totals() {
        let rows = combine_tables(
            &[business(1, 4, 2, 400.0, 80.0)],
            &[
                ad(1, Platform::Facebook, 10.0, 40.0),
                ad(1, Platform::Google, 30.0, 60.0),
            ],
        );
        let row = &rows[0];
        assert_eq!(row.impressions, Some(2000));
        assert_eq!(row.clicks, Some(100));
        assert_eq!(row.spend, Some(40.0));
        assert_eq!(row.attributed_revenue, Some(100.0));
        assert_eq!(row.metrics.ctr, Some(5.0));
        assert_eq!(row.metrics.roas, Some(2.5));
        assert_eq!(row.customer_acquisition_cost, Some(20.0));
        assert_eq!(row.marketing_attribution_rate, Some(25.0));
        assert_eq!(row.profit_margin, Some(20.0));
        assert_eq!(row.avg_order_value, Some(100.0));
    }

    #[test]
    fn zero_revenue_day_has_undefined_rates() {
        let rows = combine_tables(
            &[business(2, 0, 0, 0.0, 0.0)],
            &[ad(2, Platform::TikTok, 10.0, 5.0)],
        );
        let row = &rows[0];
        assert_eq!(row.avg_order_value, None);
        assert_eq!(row.profit_margin, None);
        assert_eq!(row.marketing_attribution_rate, None);
        assert_eq!(row.customer_acquisition_cost, None);
        assert_eq!(row.spend, Some(10.0));
    }

    #[test]
    fn split_date_groups_are_summed_before_joining() {
        let ads = vec![
            ad(1, Platform::Facebook, 10.0, 40.0),
            ad(1, Platform::Google, 30.0, 60.0),
        ];
        let per_platform = aggregate(&ads, &[Dimension::Date, Dimension::Platform]);
        let undated = aggregate(&ads, &[Dimension::Platform]);
        let mut groups = per_platform;
        groups.extend(undated);

        let rows = join(&[business(1, 4, 2, 400.0, 80.0)], &groups);
        assert_eq!(rows[0].spend, Some(40.0));
        assert_eq!(rows[0].attributed_revenue, Some(100.0));
    }

    #[test]
    fn undefined_marketing_serializes_as_null() {
        let rows = combine_tables(&[business(1, 10, 0, 1000.0, 0.0)], &[]);
        let json = serde_json::to_value(&rows[0]).expect("serialize");
        assert!(json["attributed_revenue"].is_null());
        assert!(json["ctr"].is_null());
        assert_eq!(json["avg_order_value"], 100.0);
    }
}
