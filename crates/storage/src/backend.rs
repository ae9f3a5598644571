//! Unified storage backend with enum dispatch.
//!
//! Every operation the core requires is listed on the store traits; a
//! backend that misses one fails to compile.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedstore_core::{
    Item, ItemFilter, ItemInput, ItemPage, ItemStatusChange, Source, SourceInput, SourceUnread,
    Stats, StatusUpdate, Tag, TagUnread,
};

use crate::error::StorageError;
use crate::traits::{ItemStore, SchemaStore, SourceStore, StatsStore, TagStore};

macro_rules! dispatch {
    ($self:expr, $trait:path, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            #[cfg(feature = "sqlite")]
            StorageBackend::Sqlite(s) => <crate::SqliteStorage as $trait>::$method(s, $($arg),*).await,
            #[cfg(feature = "postgres")]
            StorageBackend::Postgres(s) => <crate::PgStorage as $trait>::$method(s, $($arg),*).await,
            #[cfg(feature = "mysql")]
            StorageBackend::Mysql(s) => <crate::MysqlStorage as $trait>::$method(s, $($arg),*).await,
        }
    };
}

/// The engine selected at startup by configuration.
#[derive(Clone, Debug)]
pub enum StorageBackend {
    #[cfg(feature = "sqlite")]
    Sqlite(crate::SqliteStorage),
    #[cfg(feature = "postgres")]
    Postgres(crate::PgStorage),
    #[cfg(feature = "mysql")]
    Mysql(crate::MysqlStorage),
}

impl StorageBackend {
    #[cfg(feature = "sqlite")]
    pub fn new_sqlite(
        db_path: &std::path::Path,
        config: feedstore_core::StoreConfig,
    ) -> Result<Self, StorageError> {
        Ok(Self::Sqlite(crate::SqliteStorage::new(db_path, config)?))
    }

    #[cfg(feature = "postgres")]
    pub async fn new_postgres(
        database_url: &str,
        config: feedstore_core::StoreConfig,
    ) -> Result<Self, StorageError> {
        Ok(Self::Postgres(crate::PgStorage::new(database_url, config).await?))
    }

    #[cfg(feature = "mysql")]
    pub async fn new_mysql(
        database_url: &str,
        config: feedstore_core::StoreConfig,
    ) -> Result<Self, StorageError> {
        Ok(Self::Mysql(crate::MysqlStorage::new(database_url, config).await?))
    }
}

// ── ItemStore ────────────────────────────────────────────────────

#[async_trait]
impl ItemStore for StorageBackend {
    async fn list(&self, filter: &ItemFilter) -> Result<ItemPage, StorageError> {
        dispatch!(self, ItemStore, list(filter))
    }

    async fn get(&self, id: i64) -> Result<Option<Item>, StorageError> {
        dispatch!(self, ItemStore, get(id))
    }

    async fn insert(&self, input: &ItemInput) -> Result<i64, StorageError> {
        dispatch!(self, ItemStore, insert(input))
    }

    async fn find_existing(
        &self,
        uids: &[String],
        source: i64,
    ) -> Result<HashMap<String, i64>, StorageError> {
        dispatch!(self, ItemStore, find_existing(uids, source))
    }

    async fn update_lastseen(&self, ids: &[i64]) -> Result<(), StorageError> {
        dispatch!(self, ItemStore, update_lastseen(ids))
    }

    async fn set_unread(&self, ids: &[i64], unread: bool) -> Result<u64, StorageError> {
        dispatch!(self, ItemStore, set_unread(ids, unread))
    }

    async fn set_starred(&self, id: i64, starred: bool) -> Result<u64, StorageError> {
        dispatch!(self, ItemStore, set_starred(id, starred))
    }

    async fn apply_status_updates(
        &self,
        updates: &[StatusUpdate],
    ) -> Result<Vec<bool>, StorageError> {
        dispatch!(self, ItemStore, apply_status_updates(updates))
    }

    async fn items_since_id(
        &self,
        since_id: i64,
        not_before: Option<DateTime<Utc>>,
        how_many: u32,
    ) -> Result<Vec<Item>, StorageError> {
        dispatch!(self, ItemStore, items_since_id(since_id, not_before, how_many))
    }

    async fn statuses_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ItemStatusChange>, StorageError> {
        dispatch!(self, ItemStore, statuses_changed_since(since))
    }

    async fn last_update(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        dispatch!(self, ItemStore, last_update())
    }

    async fn last_id(&self) -> Result<i64, StorageError> {
        dispatch!(self, ItemStore, last_id())
    }

    async fn cleanup(&self, days: u32) -> Result<u64, StorageError> {
        dispatch!(self, ItemStore, cleanup(days))
    }
}

// ── SourceStore ──────────────────────────────────────────────────

#[async_trait]
impl SourceStore for StorageBackend {
    async fn insert(&self, input: &SourceInput) -> Result<i64, StorageError> {
        dispatch!(self, SourceStore, insert(input))
    }

    async fn update(&self, id: i64, input: &SourceInput) -> Result<(), StorageError> {
        dispatch!(self, SourceStore, update(id, input))
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        dispatch!(self, SourceStore, delete(id))
    }

    async fn get(&self, id: i64) -> Result<Option<Source>, StorageError> {
        dispatch!(self, SourceStore, get(id))
    }

    async fn all(&self, privileged: bool) -> Result<Vec<Source>, StorageError> {
        dispatch!(self, SourceStore, all(privileged))
    }

    async fn set_error(&self, id: i64, error: Option<&str>) -> Result<(), StorageError> {
        dispatch!(self, SourceStore, set_error(id, error))
    }

    async fn save_lastupdate(&self, id: i64, at: DateTime<Utc>) -> Result<(), StorageError> {
        dispatch!(self, SourceStore, save_lastupdate(id, at))
    }

    async fn save_lastentry(&self, id: i64, at: DateTime<Utc>) -> Result<(), StorageError> {
        dispatch!(self, SourceStore, save_lastentry(id, at))
    }

    async fn all_tags(&self) -> Result<Vec<String>, StorageError> {
        dispatch!(self, SourceStore, all_tags())
    }
}

// ── TagStore ─────────────────────────────────────────────────────

#[async_trait]
impl TagStore for StorageBackend {
    async fn save_color(&self, tag: &str, color: &str) -> Result<(), StorageError> {
        dispatch!(self, TagStore, save_color(tag, color))
    }

    async fn autocolor(&self, tag: &str) -> Result<(), StorageError> {
        dispatch!(self, TagStore, autocolor(tag))
    }

    async fn all(&self, privileged: bool) -> Result<Vec<Tag>, StorageError> {
        dispatch!(self, TagStore, all(privileged))
    }

    async fn has_tag(&self, tag: &str) -> Result<bool, StorageError> {
        dispatch!(self, TagStore, has_tag(tag))
    }

    async fn cleanup(&self, active: &[String]) -> Result<u64, StorageError> {
        dispatch!(self, TagStore, cleanup(active))
    }
}

// ── StatsStore ───────────────────────────────────────────────────

#[async_trait]
impl StatsStore for StorageBackend {
    async fn stats(&self, privileged: bool) -> Result<Stats, StorageError> {
        dispatch!(self, StatsStore, stats(privileged))
    }

    async fn unread_by_tag(&self, privileged: bool) -> Result<Vec<TagUnread>, StorageError> {
        dispatch!(self, StatsStore, unread_by_tag(privileged))
    }

    async fn unread_by_source(&self, privileged: bool) -> Result<Vec<SourceUnread>, StorageError> {
        dispatch!(self, StatsStore, unread_by_source(privileged))
    }
}

// ── SchemaStore ──────────────────────────────────────────────────

#[async_trait]
impl SchemaStore for StorageBackend {
    async fn schema_version(&self) -> Result<i32, StorageError> {
        dispatch!(self, SchemaStore, schema_version())
    }
}
