use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{error::AppError, routes::query::ViewQuery, state::AppState};

/// `GET /api/filters`: platforms, states and date bounds of the whole dataset.
#[tracing::instrument(skip(state))]
pub async fn filters(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let dataset = state.dataset().await?;
    Ok(Json(json!({ "data": dataset.filter_options() })))
}

/// `GET /api/business`: filtered business days, sorted by date.
#[tracing::instrument(skip(state))]
pub async fn business(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = q.to_filter()?;
    let view = state.dataset().await?.view(&filter);
    Ok(Json(json!({ "data": view.business })))
}

/// `GET /api/marketing`: filtered ad rows with row-level ratios.
#[tracing::instrument(skip(state))]
pub async fn marketing(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = q.to_filter()?;
    let view = state.dataset().await?.view(&filter);
    Ok(Json(json!({ "data": view.performance() })))
}

/// `GET /api/combined`: business days left-joined with daily marketing totals.
///
/// Days without ad activity carry `null` marketing fields.
#[tracing::instrument(skip(state))]
pub async fn combined(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = q.to_filter()?;
    let view = state.dataset().await?.view(&filter);
    Ok(Json(json!({ "data": view.combined })))
}
