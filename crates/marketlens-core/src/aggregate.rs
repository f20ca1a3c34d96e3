//! Grouping of ad records by dimension tuples.
//!
//! Groups re-derive every ratio from their summed counters. Per-row ratios are
//! never averaged.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::metrics::{self, DerivedMetrics};
use crate::record::{Platform, RawAdRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Date,
    Platform,
    Tactic,
    State,
    Campaign,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Date => "date",
            Dimension::Platform => "platform",
            Dimension::Tactic => "tactic",
            Dimension::State => "state",
            Dimension::Campaign => "campaign",
        }
    }

    /// Parse a comma-separated dimension list such as `"platform,tactic"`.
    /// Blank entries are skipped.
    pub fn parse_list(raw: &str) -> Result<Vec<Dimension>, CoreError> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Dimension::from_str)
            .collect()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(Dimension::Date),
            "platform" => Ok(Dimension::Platform),
            "tactic" => Ok(Dimension::Tactic),
            "state" => Ok(Dimension::State),
            "campaign" => Ok(Dimension::Campaign),
            _ => Err(CoreError::UnknownDimension(s.to_string())),
        }
    }
}

/// Values of the grouped dimensions. Dimensions that were not requested stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tactic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
}

impl GroupKey {
    fn for_record(record: &RawAdRecord, dims: &[Dimension]) -> Self {
        let mut key = GroupKey::default();
        for dim in dims {
            match dim {
                Dimension::Date => key.date = Some(record.date),
                Dimension::Platform => key.platform = Some(record.platform),
                Dimension::Tactic => key.tactic = Some(record.tactic.clone()),
                Dimension::State => key.state = Some(record.state.clone()),
                Dimension::Campaign => key.campaign = Some(record.campaign.clone()),
            }
        }
        key
    }

    pub fn value(&self, dim: Dimension) -> Option<String> {
        match dim {
            Dimension::Date => self.date.map(|d| d.format("%Y-%m-%d").to_string()),
            Dimension::Platform => self.platform.map(|p| p.to_string()),
            Dimension::Tactic => self.tactic.clone(),
            Dimension::State => self.state.clone(),
            Dimension::Campaign => self.campaign.clone(),
        }
    }

    /// Display label, e.g. `Search (Google)` for a (platform, tactic) key.
    pub fn label(&self) -> String {
        let parts: Vec<String> = [
            Dimension::Date,
            Dimension::Tactic,
            Dimension::State,
            Dimension::Campaign,
        ]
        .into_iter()
        .filter_map(|dim| self.value(dim))
        .collect();

        match (parts.is_empty(), self.platform) {
            (true, None) => "All".to_string(),
            (true, Some(platform)) => platform.to_string(),
            (false, None) => parts.join(" / "),
            (false, Some(platform)) => format!("{} ({})", parts.join(" / "), platform),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedGroup {
    #[serde(flatten)]
    pub key: GroupKey,
    pub label: String,
    pub impressions: u64,
    pub clicks: u64,
    pub spend: f64,
    pub attributed_revenue: f64,
    /// Number of source rows folded into the group.
    pub rows: usize,
    /// Distinct platforms contributing to the group.
    pub platform_count: usize,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub revenue_per_mille: Option<f64>,
}

#[derive(Default)]
struct Totals {
    impressions: u64,
    clicks: u64,
    spend: f64,
    attributed_revenue: f64,
    rows: usize,
    platforms: BTreeSet<Platform>,
}

impl Totals {
    fn add(&mut self, record: &RawAdRecord) {
        self.impressions = self.impressions.saturating_add(record.impressions);
        self.clicks = self.clicks.saturating_add(record.clicks);
        self.spend += record.spend;
        self.attributed_revenue += record.attributed_revenue;
        self.rows += 1;
        self.platforms.insert(record.platform);
    }

    fn finish(self, key: GroupKey) -> AggregatedGroup {
        AggregatedGroup {
            label: key.label(),
            key,
            impressions: self.impressions,
            clicks: self.clicks,
            spend: self.spend,
            attributed_revenue: self.attributed_revenue,
            rows: self.rows,
            platform_count: self.platforms.len(),
            metrics: DerivedMetrics::derive(
                self.impressions,
                self.clicks,
                self.spend,
                self.attributed_revenue,
            ),
            revenue_per_mille: metrics::revenue_per_mille(
                self.attributed_revenue,
                self.impressions,
            ),
        }
    }
}

/// Group `records` by the tuple of `dims` values.
///
/// Groups appear in order of first occurrence. Repeated dimensions count once;
/// an empty `dims` folds everything into a single group.
pub fn aggregate(records: &[RawAdRecord], dims: &[Dimension]) -> Vec<AggregatedGroup> {
    let mut unique: Vec<Dimension> = Vec::with_capacity(dims.len());
    for dim in dims {
        if !unique.contains(dim) {
            unique.push(*dim);
        }
    }

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Totals)> = Vec::new();
    for record in records {
        let key = GroupKey::for_record(record, &unique);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Totals::default()));
            groups.len() - 1
        });
        groups[slot].1.add(record);
    }

    groups
        .into_iter()
        .map(|(key, totals)| totals.finish(key))
        .collect()
}

/// Metric a group set can be ranked or pivoted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Impressions,
    Clicks,
    Spend,
    AttributedRevenue,
    Ctr,
    Cpc,
    Cpm,
    Roas,
    RevenuePerMille,
}

impl RankMetric {
    pub fn value(&self, group: &AggregatedGroup) -> Option<f64> {
        match self {
            RankMetric::Impressions => Some(group.impressions as f64),
            RankMetric::Clicks => Some(group.clicks as f64),
            RankMetric::Spend => Some(group.spend),
            RankMetric::AttributedRevenue => Some(group.attributed_revenue),
            RankMetric::Ctr => group.metrics.ctr,
            RankMetric::Cpc => group.metrics.cpc,
            RankMetric::Cpm => group.metrics.cpm,
            RankMetric::Roas => group.metrics.roas,
            RankMetric::RevenuePerMille => group.revenue_per_mille,
        }
    }
}

impl FromStr for RankMetric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "impressions" => Ok(RankMetric::Impressions),
            "clicks" => Ok(RankMetric::Clicks),
            "spend" => Ok(RankMetric::Spend),
            "attributed_revenue" | "revenue" => Ok(RankMetric::AttributedRevenue),
            "ctr" => Ok(RankMetric::Ctr),
            "cpc" => Ok(RankMetric::Cpc),
            "cpm" => Ok(RankMetric::Cpm),
            "roas" => Ok(RankMetric::Roas),
            "revenue_per_mille" | "efficiency" => Ok(RankMetric::RevenuePerMille),
            _ => Err(CoreError::UnknownMetric(s.to_string())),
        }
    }
}

fn compare(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn rank(
    groups: &[AggregatedGroup],
    metric: RankMetric,
    n: usize,
    descending: bool,
) -> Vec<AggregatedGroup> {
    let mut ranked: Vec<&AggregatedGroup> = groups.iter().collect();
    // `sort_by` is stable: equal values keep their input order.
    ranked.sort_by(|a, b| compare(metric.value(a), metric.value(b), descending));
    ranked.into_iter().take(n).cloned().collect()
}

/// The `n` groups with the largest `metric`. Undefined values rank last.
pub fn top_n(groups: &[AggregatedGroup], metric: RankMetric, n: usize) -> Vec<AggregatedGroup> {
    rank(groups, metric, n, true)
}

/// The `n` groups with the smallest `metric`. Undefined values rank last.
pub fn bottom_n(groups: &[AggregatedGroup], metric: RankMetric, n: usize) -> Vec<AggregatedGroup> {
    rank(groups, metric, n, false)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub row_dimension: Dimension,
    pub column_dimension: Dimension,
    pub metric: RankMetric,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[r][c]`; `None` for an absent combination or an undefined metric.
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Two-dimensional layout of `metric` over `rows` x `columns`, e.g. a
/// state x platform CTR heatmap. Labels keep first-occurrence order.
pub fn pivot(
    records: &[RawAdRecord],
    rows: Dimension,
    columns: Dimension,
    metric: RankMetric,
) -> PivotTable {
    let groups = aggregate(records, &[rows, columns]);

    let mut row_labels: Vec<String> = Vec::new();
    let mut column_labels: Vec<String> = Vec::new();
    let mut values: HashMap<(String, String), Option<f64>> = HashMap::new();
    for group in &groups {
        let (Some(r), Some(c)) = (group.key.value(rows), group.key.value(columns)) else {
            continue;
        };
        if !row_labels.contains(&r) {
            row_labels.push(r.clone());
        }
        if !column_labels.contains(&c) {
            column_labels.push(c.clone());
        }
        values.insert((r, c), metric.value(group));
    }

    let cells = row_labels
        .iter()
        .map(|r| {
            column_labels
                .iter()
                .map(|c| values.get(&(r.clone(), c.clone())).copied().flatten())
                .collect()
        })
        .collect();

    PivotTable {
        row_dimension: rows,
        column_dimension: columns,
        metric,
        rows: row_labels,
        columns: column_labels,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).expect("valid date")
    }

    fn ad(
        platform: Platform,
        tactic: &str,
        state: &str,
        impressions: u64,
        clicks: u64,
        spend: f64,
        revenue: f64,
    ) -> RawAdRecord {
        RawAdRecord {
            date: day(1),
            platform,
            tactic: tactic.to_string(),
            state: state.to_string(),
            campaign: format!("{tactic} campaign"),
            impressions,
            clicks,
            spend,
            attributed_revenue: revenue,
        }
    }

    fn sample() -> Vec<RawAdRecord> {
        vec![
            ad(Platform::Facebook, "Retargeting", "CA", 1000, 20, 40.0, 90.0),
            ad(Platform::Google, "Search", "NY", 100, 10, 50.0, 80.0),
            ad(Platform::TikTok, "Spark Ads", "CA", 4000, 40, 60.0, 30.0),
            ad(Platform::Google, "Search", "CA", 200, 30, 100.0, 150.0),
            ad(Platform::Facebook, "Prospecting", "NY", 500, 5, 12.5, 0.0),
        ]
    }

    #[test]
    fn same_key_rows_sum_and_rederive_ratios() {
        let records = vec![
            ad(Platform::Google, "Search", "CA", 100, 10, 50.0, 80.0),
            ad(Platform::Google, "Search", "CA", 200, 30, 100.0, 150.0),
        ];
        let groups = aggregate(&records, &[Dimension::Platform, Dimension::Tactic]);
        assert_eq!(groups.len(), 1);
        let g = &groups[0];
        assert_eq!(g.impressions, 300);
        assert_eq!(g.clicks, 40);
        assert_eq!(g.spend, 150.0);
        assert_eq!(g.attributed_revenue, 230.0);
        assert_eq!(g.metrics.ctr, Some(13.33));
        assert_eq!(g.metrics.roas, Some(1.53));
        assert_eq!(g.rows, 2);
        assert_eq!(g.label, "Search (Google)");
    }

    #[test]
    fn group_ctr_is_not_the_mean_of_row_ctrs() {
        let records = vec![
            ad(Platform::Google, "Search", "CA", 100, 50, 1.0, 1.0),
            ad(Platform::Google, "Search", "CA", 900, 0, 1.0, 1.0),
        ];
        let groups = aggregate(&records, &[Dimension::Platform]);
        // Mean of row CTRs would be 25.0.
        assert_eq!(groups[0].metrics.ctr, Some(5.0));
    }

    #[test]
    fn empty_dims_total_equals_sum_of_platform_groups() {
        let records = sample();
        let total = aggregate(&records, &[]);
        assert_eq!(total.len(), 1);
        assert_eq!(total[0].label, "All");

        let per_platform = aggregate(&records, &[Dimension::Platform]);
        let impressions: u64 = per_platform.iter().map(|g| g.impressions).sum();
        let clicks: u64 = per_platform.iter().map(|g| g.clicks).sum();
        let spend: f64 = per_platform.iter().map(|g| g.spend).sum();
        let revenue: f64 = per_platform.iter().map(|g| g.attributed_revenue).sum();
        let rows: usize = per_platform.iter().map(|g| g.rows).sum();

        assert_eq!(total[0].impressions, impressions);
        assert_eq!(total[0].clicks, clicks);
        assert_eq!(total[0].spend, spend);
        assert_eq!(total[0].attributed_revenue, revenue);
        assert_eq!(total[0].rows, rows);
        assert_eq!(total[0].platform_count, 3);
    }

    #[test]
    fn groups_follow_first_occurrence_order() {
        let groups = aggregate(&sample(), &[Dimension::Platform]);
        let platforms: Vec<_> = groups.iter().filter_map(|g| g.key.platform).collect();
        assert_eq!(
            platforms,
            vec![Platform::Facebook, Platform::Google, Platform::TikTok]
        );

        let states = aggregate(&sample(), &[Dimension::State]);
        let labels: Vec<_> = states.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["CA", "NY"]);
    }

    #[test]
    fn platform_count_is_distinct_platforms_per_group() {
        let states = aggregate(&sample(), &[Dimension::State]);
        assert_eq!(states[0].platform_count, 3); // CA
        assert_eq!(states[1].platform_count, 2); // NY

        let by_platform = aggregate(&sample(), &[Dimension::State, Dimension::Platform]);
        assert!(by_platform.iter().all(|g| g.platform_count == 1));
    }

    #[test]
    fn repeated_dimensions_count_once() {
        let once = aggregate(&sample(), &[Dimension::State]);
        let twice = aggregate(&sample(), &[Dimension::State, Dimension::State]);
        assert_eq!(once, twice);
    }

    #[test]
    fn no_records_no_groups() {
        assert!(aggregate(&[], &[]).is_empty());
        assert!(aggregate(&[], &[Dimension::Platform]).is_empty());
    }

    #[test]
    fn group_with_zero_impressions_has_undefined_ratios() {
        let records = vec![ad(Platform::TikTok, "Spark Ads", "TX", 0, 0, 0.0, 0.0)];
        let groups = aggregate(&records, &[Dimension::Platform]);
        assert_eq!(groups[0].metrics, DerivedMetrics::default());
        assert_eq!(groups[0].revenue_per_mille, None);
    }

    #[test]
    fn top_n_with_large_n_returns_all_sorted_descending() {
        let groups = aggregate(&sample(), &[Dimension::Platform, Dimension::Tactic]);
        let ranked = top_n(&groups, RankMetric::AttributedRevenue, 100);
        assert_eq!(ranked.len(), groups.len());
        let values: Vec<f64> = ranked.iter().map(|g| g.attributed_revenue).collect();
        assert_eq!(values, vec![230.0, 90.0, 30.0, 0.0]);
    }

    #[test]
    fn top_n_breaks_ties_by_original_order() {
        let records = vec![
            ad(Platform::Facebook, "A", "CA", 100, 10, 1.0, 5.0),
            ad(Platform::Google, "B", "CA", 100, 20, 1.0, 7.0),
            ad(Platform::TikTok, "C", "CA", 100, 10, 1.0, 5.0),
        ];
        let groups = aggregate(&records, &[Dimension::Tactic]);
        let ranked = top_n(&groups, RankMetric::Ctr, 3);
        let labels: Vec<_> = ranked.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["B", "A", "C"]);

        let first_two = top_n(&groups, RankMetric::Ctr, 2);
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[1].label, "A");
    }

    #[test]
    fn undefined_values_rank_last_both_ways() {
        let records = vec![
            ad(Platform::Facebook, "NoClicks", "CA", 100, 0, 5.0, 0.0),
            ad(Platform::Google, "Cheap", "CA", 100, 10, 5.0, 0.0),
            ad(Platform::TikTok, "Pricey", "CA", 100, 1, 5.0, 0.0),
        ];
        let groups = aggregate(&records, &[Dimension::Tactic]);

        let highest = top_n(&groups, RankMetric::Cpc, 3);
        let labels: Vec<_> = highest.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Pricey", "Cheap", "NoClicks"]);

        let lowest = bottom_n(&groups, RankMetric::Cpc, 3);
        let labels: Vec<_> = lowest.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Cheap", "Pricey", "NoClicks"]);
    }

    #[test]
    fn top_n_zero_is_empty() {
        let groups = aggregate(&sample(), &[Dimension::Platform]);
        assert!(top_n(&groups, RankMetric::Spend, 0).is_empty());
    }

    #[test]
    fn pivot_leaves_missing_combinations_undefined() {
        let table = pivot(
            &sample(),
            Dimension::State,
            Dimension::Platform,
            RankMetric::Ctr,
        );
        assert_eq!(table.rows, vec!["CA", "NY"]);
        assert_eq!(table.columns, vec!["Facebook", "Google", "TikTok"]);
        // CA: Facebook 2.0, Google 15.0, TikTok 1.0
        assert_eq!(table.cells[0], vec![Some(2.0), Some(15.0), Some(1.0)]);
        // NY has no TikTok rows.
        assert_eq!(table.cells[1], vec![Some(1.0), Some(10.0), None]);
    }

    #[test]
    fn parse_dimension_list() {
        assert_eq!(
            Dimension::parse_list("platform, Tactic,,"),
            Ok(vec![Dimension::Platform, Dimension::Tactic])
        );
        assert!(Dimension::parse_list("platform,country").is_err());
        assert_eq!("revenue".parse::<RankMetric>(), Ok(RankMetric::AttributedRevenue));
    }

    #[test]
    fn group_serializes_only_requested_key_fields() {
        let groups = aggregate(&sample(), &[Dimension::State]);
        let json = serde_json::to_value(&groups[0]).expect("serialize");
        assert_eq!(json["state"], "CA");
        assert!(json.get("platform").is_none());
        assert!(json.get("ctr").is_some());
    }
}
