//! Headline cards and analysis panels computed from a filtered view.

use serde::Serialize;

use crate::aggregate::{aggregate, bottom_n, top_n, AggregatedGroup, Dimension, RankMetric};
use crate::join::CombinedDayRecord;
use crate::metrics::{self, round2};
use crate::record::RawAdRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub days: usize,
    pub total_revenue: f64,
    pub avg_daily_revenue: Option<f64>,
    pub total_orders: u64,
    pub avg_daily_orders: Option<f64>,
    /// Days that have marketing data.
    pub marketing_days: usize,
    pub total_spend: f64,
    pub avg_daily_spend: Option<f64>,
    pub total_attributed_revenue: f64,
    /// Re-derived from summed clicks and impressions.
    pub overall_ctr: Option<f64>,
    pub overall_roas: Option<f64>,
}

/// Counter totals saturate, like the group totals in `aggregate`.
fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

impl KpiSummary {
    pub fn from_combined(rows: &[CombinedDayRecord]) -> Self {
        let days = rows.len();
        let total_revenue: f64 = rows.iter().map(|r| r.total_revenue).sum();
        let total_orders = saturating_total(rows.iter().map(|r| r.order_count));

        let marketing: Vec<&CombinedDayRecord> =
            rows.iter().filter(|r| r.spend.is_some()).collect();
        let marketing_days = marketing.len();
        let total_spend: f64 = marketing.iter().filter_map(|r| r.spend).sum();
        let total_attributed_revenue: f64 =
            marketing.iter().filter_map(|r| r.attributed_revenue).sum();
        let impressions = saturating_total(marketing.iter().filter_map(|r| r.impressions));
        let clicks = saturating_total(marketing.iter().filter_map(|r| r.clicks));

        Self {
            days,
            total_revenue,
            avg_daily_revenue: metrics::ratio(total_revenue, days as f64, 1.0),
            total_orders,
            avg_daily_orders: metrics::ratio(total_orders as f64, days as f64, 1.0),
            marketing_days,
            total_spend,
            avg_daily_spend: metrics::ratio(total_spend, marketing_days as f64, 1.0),
            total_attributed_revenue,
            overall_ctr: metrics::ctr(impressions, clicks),
            overall_roas: metrics::roas(total_attributed_revenue, total_spend),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateLeader {
    pub state: String,
    pub value: f64,
}

/// State panel cards: best states by revenue, CTR and CPC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateLeaders {
    pub top_revenue: Option<StateLeader>,
    pub best_ctr: Option<StateLeader>,
    /// Lowest cost per click.
    pub best_cpc: Option<StateLeader>,
    pub states_active: usize,
    /// Sum of distinct platforms per state.
    pub platform_combinations: usize,
}

fn leader(ranked: Vec<AggregatedGroup>, metric: RankMetric) -> Option<StateLeader> {
    let first = ranked.into_iter().next()?;
    let value = metric.value(&first)?;
    Some(StateLeader {
        state: first.key.state.unwrap_or_default(),
        value,
    })
}

impl StateLeaders {
    pub fn from_ads(ads: &[RawAdRecord]) -> Self {
        Self::from_groups(&aggregate(ads, &[Dimension::State]))
    }

    /// `groups` must be the result of grouping by state.
    pub fn from_groups(groups: &[AggregatedGroup]) -> Self {
        Self {
            top_revenue: leader(
                top_n(groups, RankMetric::AttributedRevenue, 1),
                RankMetric::AttributedRevenue,
            ),
            best_ctr: leader(top_n(groups, RankMetric::Ctr, 1), RankMetric::Ctr),
            best_cpc: leader(bottom_n(groups, RankMetric::Cpc, 1), RankMetric::Cpc),
            states_active: groups.len(),
            platform_combinations: groups.iter().map(|g| g.platform_count).sum(),
        }
    }
}

/// Numeric columns of the combined table that take part in the correlation matrix.
pub const CORRELATION_COLUMNS: [&str; 10] = [
    "total_revenue",
    "gross_profit",
    "order_count",
    "new_customers",
    "spend",
    "attributed_revenue",
    "impressions",
    "clicks",
    "ctr",
    "cpc",
];

fn column_value(row: &CombinedDayRecord, column: usize) -> Option<f64> {
    match column {
        0 => Some(row.total_revenue),
        1 => Some(row.gross_profit),
        2 => Some(row.order_count as f64),
        3 => Some(row.new_customers as f64),
        4 => row.spend,
        5 => row.attributed_revenue,
        6 => row.impressions.map(|v| v as f64),
        7 => row.clicks.map(|v| v as f64),
        8 => row.metrics.ctr,
        9 => row.metrics.cpc,
        _ => None,
    }
}

/// Pearson correlation over rows where both values are defined.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(round2(cov / (var_x.sqrt() * var_y.sqrt())))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` correlates `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn from_combined(rows: &[CombinedDayRecord]) -> Self {
        let width = CORRELATION_COLUMNS.len();
        let mut values = vec![vec![None; width]; width];
        for i in 0..width {
            for j in i..width {
                let pairs: Vec<(f64, f64)> = rows
                    .iter()
                    .filter_map(|row| Some((column_value(row, i)?, column_value(row, j)?)))
                    .collect();
                let r = pearson(&pairs);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Self {
            columns: CORRELATION_COLUMNS.iter().map(|c| c.to_string()).collect(),
            values,
        }
    }
}
