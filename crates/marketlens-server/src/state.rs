use std::sync::Arc;

use anyhow::anyhow;

use marketlens_core::{config::Config, dataset::Dataset};
use marketlens_csv::DatasetCache;

use crate::error::AppError;

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// Requests only ever read the cached [`Dataset`]; filtered and aggregated
/// tables are built per request and dropped with the response.
pub struct AppState {
    /// Cache of the normalized source files. Loads run on the blocking pool.
    pub cache: Arc<DatasetCache>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(cache: DatasetCache, config: Config) -> Self {
        Self {
            cache: Arc::new(cache),
            config: Arc::new(config),
        }
    }

    /// The cached dataset, loading it first if the cache is empty.
    pub async fn dataset(&self) -> Result<Arc<Dataset>, AppError> {
        if let Some(dataset) = self.cache.cached() {
            return Ok(dataset);
        }
        let cache = Arc::clone(&self.cache);
        let dataset = tokio::task::spawn_blocking(move || cache.get())
            .await
            .map_err(|e| AppError::Internal(anyhow!("dataset load task failed: {e}")))??;
        Ok(dataset)
    }

    /// Re-read the source files and replace the cached dataset.
    pub async fn reload(&self) -> Result<Arc<Dataset>, AppError> {
        let cache = Arc::clone(&self.cache);
        let dataset = tokio::task::spawn_blocking(move || cache.reload())
            .await
            .map_err(|e| AppError::Internal(anyhow!("dataset reload task failed: {e}")))??;
        Ok(dataset)
    }
}
