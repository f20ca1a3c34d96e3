use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// `POST /api/reload`: re-read the source files.
///
/// A failed reload answers `503` and keeps serving the previous dataset.
#[tracing::instrument(skip(state))]
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let dataset = state.reload().await?;
    Ok(Json(json!({
        "data": {
            "business_days": dataset.business().len(),
            "ad_rows": dataset.ads().len(),
            "combined_days": dataset.combined().len()
        }
    })))
}
