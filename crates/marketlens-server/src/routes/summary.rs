use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use marketlens_core::summary::{CorrelationMatrix, KpiSummary, StateLeaders};

use crate::{error::AppError, routes::query::ViewQuery, state::AppState};

/// `GET /api/summary`: headline KPIs and per-state leaders for the view.
#[tracing::instrument(skip(state))]
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = q.to_filter()?;
    let view = state.dataset().await?.view(&filter);
    Ok(Json(json!({
        "data": {
            "kpis": KpiSummary::from_combined(&view.combined),
            "state_leaders": StateLeaders::from_ads(&view.ads)
        }
    })))
}

/// `GET /api/correlation`: pairwise Pearson matrix over the combined table.
#[tracing::instrument(skip(state))]
pub async fn correlation(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = q.to_filter()?;
    let view = state.dataset().await?.view(&filter);
    Ok(Json(json!({ "data": CorrelationMatrix::from_combined(&view.combined) })))
}
