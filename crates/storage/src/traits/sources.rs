use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedstore_core::{Source, SourceInput};

use crate::error::StorageError;

/// Subscription management.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Create a subscription. Returns the new id.
    async fn insert(&self, input: &SourceInput) -> Result<i64, StorageError>;

    /// Replace the user-editable fields of a subscription.
    async fn update(&self, id: i64, input: &SourceInput) -> Result<(), StorageError>;

    /// Delete a subscription and all of its items in one logical unit.
    /// Cascade is enforced here, not by the database, for cross-engine
    /// portability.
    async fn delete(&self, id: i64) -> Result<(), StorageError>;

    async fn get(&self, id: i64) -> Result<Option<Source>, StorageError>;

    /// All subscriptions, erroring ones first, then by lowercase title.
    /// Non-privileged callers do not see privately tagged sources.
    async fn all(&self, privileged: bool) -> Result<Vec<Source>, StorageError>;

    /// Record the last acquisition error; `None` clears it.
    async fn set_error(&self, id: i64, error: Option<&str>) -> Result<(), StorageError>;

    /// Record a successful poll.
    async fn save_lastupdate(&self, id: i64, at: DateTime<Utc>) -> Result<(), StorageError>;

    /// Record the publication time of the newest item seen on this source.
    async fn save_lastentry(&self, id: i64, at: DateTime<Utc>) -> Result<(), StorageError>;

    /// Distinct tag names across all sources, in first-use order.
    async fn all_tags(&self) -> Result<Vec<String>, StorageError>;
}
