use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Every `/api/*` read accepts the same filter parameters (`start_date`,
/// `end_date`, `platforms`, `states`); see [`routes::query::ViewQuery`].
/// Responses are gzip-compressed when the client sends `Accept-Encoding: gzip`.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/filters", get(routes::tables::filters))
        .route("/api/business", get(routes::tables::business))
        .route("/api/marketing", get(routes::tables::marketing))
        .route("/api/combined", get(routes::tables::combined))
        .route("/api/breakdown", get(routes::breakdown::breakdown))
        .route("/api/pivot", get(routes::breakdown::pivot))
        .route("/api/summary", get(routes::summary::summary))
        .route("/api/correlation", get(routes::summary::correlation))
        .route("/api/export", get(routes::export::export_table))
        .route("/api/reload", post(routes::reload::reload))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Permissive CORS unless `MARKETLENS_CORS_ORIGINS` names specific origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(allowed))
    }
}
