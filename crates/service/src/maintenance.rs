//! Retention cleanup and tag color garbage collection.

use std::sync::Arc;

use feedstore_core::StoreConfig;
use feedstore_storage::{ItemStore, SourceStore, StorageBackend, TagStore};

use crate::error::ServiceError;

/// What one maintenance run removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub items_removed: u64,
    pub tag_colors_removed: u64,
}

#[derive(Clone)]
pub struct MaintenanceService {
    storage: Arc<StorageBackend>,
    config: StoreConfig,
}

impl MaintenanceService {
    pub fn new(storage: Arc<StorageBackend>, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    /// Delete orphaned and aged-out items, then drop color rows for tags
    /// no source references anymore.
    pub async fn cleanup(&self) -> Result<CleanupReport, ServiceError> {
        let items_removed =
            ItemStore::cleanup(self.storage.as_ref(), self.config.retention_days).await?;

        let active = self.storage.all_tags().await?;
        let tag_colors_removed = TagStore::cleanup(self.storage.as_ref(), &active).await?;

        tracing::info!(items_removed, tag_colors_removed, "maintenance cleanup finished");
        Ok(CleanupReport { items_removed, tag_colors_removed })
    }
}
