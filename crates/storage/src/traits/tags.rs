use async_trait::async_trait;
use feedstore_core::Tag;

use crate::error::StorageError;

/// Tag metadata: colors and lifecycle.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Insert or update a tag's display color.
    async fn save_color(&self, tag: &str, color: &str) -> Result<(), StorageError>;

    /// Assign a deterministic unused color to a tag that has none yet.
    /// Blank and already-colored tags are skipped.
    async fn autocolor(&self, tag: &str) -> Result<(), StorageError>;

    /// All tags ordered by lowercase name. Non-privileged callers do not
    /// see private-marked tags.
    async fn all(&self, privileged: bool) -> Result<Vec<Tag>, StorageError>;

    async fn has_tag(&self, tag: &str) -> Result<bool, StorageError>;

    /// Drop color rows for tags no longer referenced by any source.
    /// Returns the number of removed rows.
    async fn cleanup(&self, active: &[String]) -> Result<u64, StorageError>;
}
