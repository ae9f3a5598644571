//! Validated item queries and mutations.

use std::sync::Arc;

use feedstore_core::{
    Item, ItemFilter, SourceUnread, StoreConfig, TagUnread, ValidationError, validate_ids,
};
use feedstore_storage::{ItemStore, StatsStore, StorageBackend, StorageError};
use serde::Serialize;

use crate::error::ServiceError;

/// One listing response: the requested page plus the aggregate counters
/// a client renders alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct EntriesPage {
    pub entries: Vec<Item>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    pub all: u64,
    pub unread: u64,
    pub starred: u64,
    pub tags: Vec<TagUnread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceUnread>>,
}

/// Item read and status-mutation operations.
#[derive(Clone)]
pub struct ItemService {
    storage: Arc<StorageBackend>,
    config: StoreConfig,
}

impl ItemService {
    pub fn new(storage: Arc<StorageBackend>, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    /// Validate raw pagination numbers from a request.
    pub fn page_window(&self, offset: i64, size: i64) -> Result<(u32, u32), ValidationError> {
        let offset = u32::try_from(offset)
            .map_err(|_| ValidationError::InvalidPageWindow { offset, size })?;
        if size < 0 || size > i64::from(self.config.items_per_page_max) {
            return Err(ValidationError::InvalidPageWindow { offset: i64::from(offset), size });
        }
        Ok((offset, size as u32))
    }

    /// One page of items with the aggregates rendered next to it.
    ///
    /// Unknown tag or source filters are not errors; they match nothing
    /// and yield an empty page.
    pub async fn list(
        &self,
        filter: &ItemFilter,
        want_sources: bool,
    ) -> Result<EntriesPage, ServiceError> {
        let page = self.storage.list(filter).await?;
        let stats = self.storage.stats(filter.privileged).await?;
        let tags = self.storage.unread_by_tag(filter.privileged).await?;
        let sources = if want_sources {
            Some(self.storage.unread_by_source(filter.privileged).await?)
        } else {
            None
        };
        Ok(EntriesPage {
            entries: page.entries,
            has_more: page.has_more,
            all: stats.total,
            unread: stats.unread,
            starred: stats.starred,
            tags,
            sources,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<Item>, ServiceError> {
        validate_ids(&[id])?;
        Ok(self.storage.get(id).await?)
    }

    /// Mark a batch of items read. Returns the number of items affected;
    /// already-read and unknown ids simply do not count.
    pub async fn mark_read(&self, ids: &[i64]) -> Result<u64, ServiceError> {
        validate_ids(ids)?;
        Ok(self.storage.set_unread(ids, false).await?)
    }

    pub async fn mark_unread(&self, ids: &[i64]) -> Result<u64, ServiceError> {
        validate_ids(ids)?;
        Ok(self.storage.set_unread(ids, true).await?)
    }

    pub async fn star(&self, id: i64) -> Result<(), ServiceError> {
        self.set_starred(id, true).await
    }

    pub async fn unstar(&self, id: i64) -> Result<(), ServiceError> {
        self.set_starred(id, false).await
    }

    async fn set_starred(&self, id: i64, starred: bool) -> Result<(), ServiceError> {
        validate_ids(&[id])?;
        let affected = self.storage.set_starred(id, starred).await?;
        if affected == 0 {
            return Err(StorageError::NotFound { entity: "item", id }.into());
        }
        Ok(())
    }
}
