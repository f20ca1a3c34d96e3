use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use marketlens_core::dataset::Dataset;

use crate::error::Result;
use crate::loader::{load_dataset, SourceFiles};

/// Process-wide cache of the normalized dataset, keyed by a fixed file set.
///
/// The cached [`Dataset`] is immutable; callers get an `Arc` and never hold
/// the lock while computing views. There is no staleness detection: the slot
/// is refreshed only by [`DatasetCache::clear`] or [`DatasetCache::reload`].
pub struct DatasetCache {
    files: SourceFiles,
    slot: RwLock<Option<Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new(files: SourceFiles) -> Self {
        Self {
            files,
            slot: RwLock::new(None),
        }
    }

    /// The cached dataset, if one has been loaded.
    pub fn cached(&self) -> Option<Arc<Dataset>> {
        self.slot.read().clone()
    }

    /// Return the cached dataset, loading it on first use.
    pub fn get(&self) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.cached() {
            return Ok(dataset);
        }
        let mut slot = self.slot.write();
        // Another caller may have loaded while we waited for the write lock.
        if let Some(dataset) = slot.as_ref() {
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(load_dataset(&self.files)?);
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn clear(&self) {
        *self.slot.write() = None;
        info!("Dataset cache cleared");
    }

    /// Load the sources again and swap the result in.
    ///
    /// On failure the previously cached dataset stays in place.
    pub fn reload(&self) -> Result<Arc<Dataset>> {
        let dataset = Arc::new(load_dataset(&self.files)?);
        *self.slot.write() = Some(Arc::clone(&dataset));
        info!(
            ad_rows = dataset.ads().len(),
            business_days = dataset.business().len(),
            "Dataset cache reloaded"
        );
        Ok(dataset)
    }
}
