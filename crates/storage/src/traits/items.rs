use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedstore_core::{Item, ItemFilter, ItemInput, ItemPage, ItemStatusChange, StatusUpdate};

use crate::error::StorageError;

/// CRUD, query, retention and sync queries on items.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Filtered, paginated listing with single-row lookahead for `has_more`.
    async fn list(&self, filter: &ItemFilter) -> Result<ItemPage, StorageError>;

    /// Fetch one item with its denormalized source fields.
    async fn get(&self, id: i64) -> Result<Option<Item>, StorageError>;

    /// Insert a freshly acquired item. Returns the new id.
    ///
    /// New items start unread and unstarred; `updatetime` and `lastseen`
    /// are initialized to now.
    async fn insert(&self, input: &ItemInput) -> Result<i64, StorageError>;

    /// Map already-stored uids of one source to their item ids, so
    /// acquisition can skip duplicates.
    async fn find_existing(
        &self,
        uids: &[String],
        source: i64,
    ) -> Result<HashMap<String, i64>, StorageError>;

    /// Refresh retention eligibility for items still present in their feed.
    /// Must NOT advance `updatetime`.
    async fn update_lastseen(&self, ids: &[i64]) -> Result<(), StorageError>;

    /// Set unread on a batch of ids, advancing `updatetime` to now.
    /// Returns the number of affected rows.
    async fn set_unread(&self, ids: &[i64], unread: bool) -> Result<u64, StorageError>;

    /// Set starred on one id, advancing `updatetime` to now.
    async fn set_starred(&self, id: i64, starred: bool) -> Result<u64, StorageError>;

    /// Apply a batch of client status updates in one transaction, each
    /// under the last-writer-wins rule: an update lands iff its datetime
    /// is not older than the stored `updatetime`. Returns one flag per
    /// update in input order; `false` marks an update discarded as stale
    /// or targeting a missing item. An error rolls the whole batch back,
    /// so partial application is never observable.
    async fn apply_status_updates(
        &self,
        updates: &[StatusUpdate],
    ) -> Result<Vec<bool>, StorageError>;

    /// New items for the sync cursor: id strictly greater than `since_id`,
    /// publication or lastseen not before `not_before`, ascending by id,
    /// at most `how_many`.
    async fn items_since_id(
        &self,
        since_id: i64,
        not_before: Option<DateTime<Utc>>,
        how_many: u32,
    ) -> Result<Vec<Item>, StorageError>;

    /// Items whose `updatetime` is strictly greater than `since`.
    async fn statuses_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ItemStatusChange>, StorageError>;

    /// Maximum `updatetime` across all items, if any exist.
    async fn last_update(&self) -> Result<Option<DateTime<Utc>>, StorageError>;

    /// Highest item id, or 0 for an empty store.
    async fn last_id(&self) -> Result<i64, StorageError>;

    /// Delete orphaned items (source gone) and, when `days` is nonzero,
    /// non-starred items older than now - days. Starred items are exempt
    /// from the age rule. Returns the number of deleted rows.
    async fn cleanup(&self, days: u32) -> Result<u64, StorageError>;
}
