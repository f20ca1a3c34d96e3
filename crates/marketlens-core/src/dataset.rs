//! The immutable normalized base data and its request-scoped views.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::filter::DatasetFilter;
use crate::join::{combine_tables, CombinedDayRecord};
use crate::record::{performance_table, AdPerformanceRow, BusinessDayRecord, Platform, RawAdRecord};

/// Normalized business and ad tables plus the unfiltered combined table.
///
/// Built once per load and never mutated afterwards, so it can be shared
/// behind an `Arc` by concurrent requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    business: Vec<BusinessDayRecord>,
    ads: Vec<RawAdRecord>,
    combined: Vec<CombinedDayRecord>,
}

impl Dataset {
    /// Business rows are sorted by date; a repeated date is rejected. Ad rows
    /// keep the order they were given in.
    pub fn new(mut business: Vec<BusinessDayRecord>, ads: Vec<RawAdRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(business.len());
        for record in &business {
            if !seen.insert(record.date) {
                return Err(CoreError::DuplicateBusinessDate(record.date));
            }
        }
        business.sort_by_key(|record| record.date);
        let combined = combine_tables(&business, &ads);
        Ok(Self {
            business,
            ads,
            combined,
        })
    }

    pub fn business(&self) -> &[BusinessDayRecord] {
        &self.business
    }

    pub fn ads(&self) -> &[RawAdRecord] {
        &self.ads
    }

    pub fn combined(&self) -> &[CombinedDayRecord] {
        &self.combined
    }

    /// Apply `filter` and re-join. The combined table of the view only counts
    /// the ad rows that passed the filter.
    pub fn view(&self, filter: &DatasetFilter) -> DashboardView {
        if filter.is_pass_through() {
            return DashboardView {
                business: self.business.clone(),
                ads: self.ads.clone(),
                combined: self.combined.clone(),
            };
        }
        let business = filter.apply_business(&self.business);
        let ads = filter.apply_ads(&self.ads);
        let combined = combine_tables(&business, &ads);
        DashboardView {
            business,
            ads,
            combined,
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        let mut platforms: Vec<Platform> = Vec::new();
        let mut states: Vec<String> = Vec::new();
        for record in &self.ads {
            if !platforms.contains(&record.platform) {
                platforms.push(record.platform);
            }
            if !states.contains(&record.state) {
                states.push(record.state.clone());
            }
        }
        FilterOptions {
            platforms,
            states,
            min_date: self.business.first().map(|r| r.date),
            max_date: self.business.last().map(|r| r.date),
        }
    }
}

/// Values the sidebar filters can choose from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub platforms: Vec<Platform>,
    pub states: Vec<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

/// Tables derived for one filter selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub business: Vec<BusinessDayRecord>,
    pub ads: Vec<RawAdRecord>,
    pub combined: Vec<CombinedDayRecord>,
}

impl DashboardView {
    /// The unified ad table with row-level ratios.
    pub fn performance(&self) -> Vec<AdPerformanceRow> {
        performance_table(&self.ads)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::aggregate::{aggregate, Dimension};
    use crate::filter::DateRange;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).expect("valid date")
    }

    fn business(d: u32, revenue: f64) -> BusinessDayRecord {
        BusinessDayRecord {
            date: day(d),
            order_count: 10,
            new_customers: 2,
            total_revenue: revenue,
            gross_profit: revenue / 4.0,
        }
    }

    fn ad(d: u32, platform: Platform, state: &str, spend: f64) -> RawAdRecord {
        RawAdRecord {
            date: day(d),
            platform,
            tactic: "Search".to_string(),
            state: state.to_string(),
            campaign: "Brand".to_string(),
            impressions: 1000,
            clicks: 10,
            spend,
            attributed_revenue: spend * 2.0,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec![business(2, 200.0), business(1, 100.0), business(3, 300.0)],
            vec![
                ad(1, Platform::Facebook, "CA", 10.0),
                ad(1, Platform::Google, "NY", 20.0),
                ad(2, Platform::TikTok, "CA", 30.0),
                ad(3, Platform::Facebook, "TX", 40.0),
            ],
        )
        .expect("dataset")
    }

    #[test]
    fn business_rows_are_sorted_and_combined() {
        let data = dataset();
        let dates: Vec<_> = data.business().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(data.combined().len(), 3);
        assert_eq!(data.combined()[0].spend, Some(30.0));
    }

    #[test]
    fn duplicate_business_dates_are_rejected() {
        let err = Dataset::new(vec![business(1, 1.0), business(1, 2.0)], vec![]).unwrap_err();
        assert_eq!(err, CoreError::DuplicateBusinessDate(day(1)));
    }

    #[test]
    fn facebook_only_view_reaggregates_to_one_platform() {
        let data = dataset();
        let view = data.view(&DatasetFilter {
            platforms: BTreeSet::from([Platform::Facebook]),
            ..DatasetFilter::default()
        });
        assert!(view.ads.iter().all(|r| r.platform == Platform::Facebook));
        assert_eq!(aggregate(&view.ads, &[Dimension::Platform]).len(), 1);
        // Every business day survives; day 2 only had TikTok spend.
        assert_eq!(view.combined.len(), 3);
        assert_eq!(view.combined[0].spend, Some(10.0));
        assert_eq!(view.combined[1].spend, None);
    }

    #[test]
    fn date_range_view_trims_both_tables() {
        let data = dataset();
        let view = data.view(&DatasetFilter {
            date_range: Some(DateRange::new(day(2), day(3)).expect("range")),
            ..DatasetFilter::default()
        });
        assert_eq!(view.business.len(), 2);
        assert_eq!(view.ads.len(), 2);
        assert_eq!(view.combined.len(), 2);
    }

    #[test]
    fn pass_through_view_equals_base_tables() {
        let data = dataset();
        let view = data.view(&DatasetFilter::default());
        assert_eq!(view.business, data.business());
        assert_eq!(view.ads, data.ads());
        assert_eq!(view.combined, data.combined());
        assert_eq!(view.performance().len(), 4);
    }

    #[test]
    fn filter_options_keep_first_occurrence_order() {
        let options = dataset().filter_options();
        assert_eq!(
            options.platforms,
            vec![Platform::Facebook, Platform::Google, Platform::TikTok]
        );
        assert_eq!(options.states, vec!["CA", "NY", "TX"]);
        assert_eq!(options.min_date, Some(day(1)));
        assert_eq!(options.max_date, Some(day(3)));
    }
}
