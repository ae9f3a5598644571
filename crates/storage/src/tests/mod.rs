#![cfg(feature = "sqlite")]
//! Integration tests against the sqlite backend.
//!
//! Every backend runs the same logical queries through the shared
//! builder, so the embedded engine doubles as the test vehicle.

mod migration_tests;
mod source_tests;
mod stats_tests;
mod sync_tests;
mod tag_tests;

use chrono::{DateTime, Utc};
use feedstore_core::{ItemInput, SourceInput, StoreConfig};
use tempfile::TempDir;

use crate::sqlite::SqliteStorage;
use crate::traits::{ItemStore, SourceStore};

pub(crate) struct TestStore {
    pub storage: SqliteStorage,
    _dir: TempDir,
}

pub(crate) fn test_storage() -> TestStore {
    test_storage_with(StoreConfig::default())
}

pub(crate) fn test_storage_with(config: StoreConfig) -> TestStore {
    let dir = tempfile::tempdir().expect("create temp dir");
    let storage =
        SqliteStorage::new(&dir.path().join("feedstore.db"), config).expect("open storage");
    TestStore { storage, _dir: dir }
}

pub(crate) async fn seed_source(storage: &SqliteStorage, title: &str, tags: &[&str]) -> i64 {
    let input = SourceInput {
        title: title.to_owned(),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        filter: None,
        spout: "rss".to_owned(),
        params: "{}".to_owned(),
    };
    SourceStore::insert(storage, &input).await.expect("insert source")
}

pub(crate) fn item_input(source: i64, uid: &str, datetime: DateTime<Utc>) -> ItemInput {
    ItemInput {
        datetime,
        title: format!("title {uid}"),
        content: format!("content {uid}"),
        source,
        thumbnail: None,
        icon: None,
        uid: uid.to_owned(),
        link: format!("https://example.com/{uid}"),
        author: None,
    }
}

pub(crate) async fn seed_item(
    storage: &SqliteStorage,
    source: i64,
    uid: &str,
    datetime: DateTime<Utc>,
) -> i64 {
    ItemStore::insert(storage, &item_input(source, uid, datetime)).await.expect("insert item")
}
