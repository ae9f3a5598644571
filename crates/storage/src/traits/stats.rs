use async_trait::async_trait;
use feedstore_core::{SourceUnread, Stats, TagUnread};

use crate::error::StorageError;

/// Count aggregates over items.
///
/// For non-privileged callers, privately tagged sources are excluded from
/// every aggregate. Hidden-tag unread counts are subtracted from the global
/// unread figure for every caller.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Global total/unread/starred counts.
    async fn stats(&self, privileged: bool) -> Result<Stats, StorageError>;

    /// Unread counts per tag, with tag colors.
    async fn unread_by_tag(&self, privileged: bool) -> Result<Vec<TagUnread>, StorageError>;

    /// Unread counts per source.
    async fn unread_by_source(&self, privileged: bool) -> Result<Vec<SourceUnread>, StorageError>;
}
