use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

/// `GET /health`: liveness check.
///
/// Always `200 OK` while the process serves requests. `dataset` reports
/// whether the source files are currently cached; a missing dataset is
/// loaded lazily by the first `/api/*` read.
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dataset = match state.cache.cached() {
        Some(_) => "loaded",
        None => "not_loaded",
    };
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "dataset": dataset
        })),
    )
}
