use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use marketlens_core::aggregate::{
    aggregate, bottom_n, pivot as pivot_table, top_n, Dimension, RankMetric,
};

use crate::{
    error::AppError,
    routes::query::{parse_limit, ViewQuery},
    state::AppState,
};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct BreakdownParams {
    /// Comma-separated grouping dimensions. Defaults to `platform`.
    pub dims: Option<String>,
    /// Ranking metric. Without it groups keep first-occurrence order.
    pub sort: Option<String>,
    /// `desc` (default) or `asc`.
    pub order: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /api/breakdown`: ad rows aggregated by the requested dimensions.
#[tracing::instrument(skip(state))]
pub async fn breakdown(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewQuery>,
    Query(params): Query<BreakdownParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = q.to_filter()?;
    let dims = match params.dims.as_deref().map(str::trim) {
        None | Some("") => vec![Dimension::Platform],
        Some(raw) => Dimension::parse_list(raw)?,
    };
    let sort = params
        .sort
        .as_deref()
        .map(RankMetric::from_str)
        .transpose()?;
    let descending = match params.order.as_deref().map(str::trim) {
        None | Some("desc") => true,
        Some("asc") => false,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "order must be one of: asc, desc (got {other})"
            )))
        }
    };

    let view = state.dataset().await?.view(&filter);
    let groups = aggregate(&view.ads, &dims);
    let total = groups.len();
    let data = match sort {
        Some(metric) => {
            let limit = parse_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT)?;
            if descending {
                top_n(&groups, metric, limit)
            } else {
                bottom_n(&groups, metric, limit)
            }
        }
        None => groups,
    };

    Ok(Json(json!({
        "data": data,
        "dimensions": dims,
        "total_groups": total
    })))
}

#[derive(Debug, Deserialize)]
pub struct PivotParams {
    pub rows: Option<String>,
    pub columns: Option<String>,
    pub metric: Option<String>,
}

/// `GET /api/pivot`: one metric laid out over two dimensions.
///
/// Defaults to a state x platform CTR grid.
#[tracing::instrument(skip(state))]
pub async fn pivot(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewQuery>,
    Query(params): Query<PivotParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = q.to_filter()?;
    let rows = params
        .rows
        .as_deref()
        .map_or(Ok(Dimension::State), Dimension::from_str)?;
    let columns = params
        .columns
        .as_deref()
        .map_or(Ok(Dimension::Platform), Dimension::from_str)?;
    if rows == columns {
        return Err(AppError::BadRequest(
            "rows and columns must be different dimensions".to_string(),
        ));
    }
    let metric = params
        .metric
        .as_deref()
        .map_or(Ok(RankMetric::Ctr), RankMetric::from_str)?;

    let view = state.dataset().await?.view(&filter);
    Ok(Json(json!({ "data": pivot_table(&view.ads, rows, columns, metric) })))
}
