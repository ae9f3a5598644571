use chrono::Utc;
use feedstore_core::StoreConfig;
use rusqlite::Connection;

use super::{seed_item, seed_source, test_storage};
use crate::sqlite::SqliteStorage;
use crate::traits::{ItemStore, SchemaStore, SourceStore};

#[tokio::test]
async fn fresh_store_reports_the_current_version() {
    let t = test_storage();
    assert_eq!(t.storage.schema_version().await.unwrap(), 5);
}

#[tokio::test]
async fn reopening_a_store_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feedstore.db");

    let first = SqliteStorage::new(&path, StoreConfig::default()).unwrap();
    let source = seed_source(&first, "feed", &[]).await;
    let item = seed_item(&first, source, "a", Utc::now()).await;
    drop(first);

    let second = SqliteStorage::new(&path, StoreConfig::default()).unwrap();
    assert_eq!(second.schema_version().await.unwrap(), 5);
    assert!(ItemStore::get(&second, item).await.unwrap().is_some());
}

/// The items/sources shape before versions 2..=5 landed.
fn create_legacy_v1_db(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE items (
             id        INTEGER PRIMARY KEY AUTOINCREMENT,
             datetime  TEXT NOT NULL,
             title     TEXT NOT NULL,
             content   TEXT NOT NULL,
             thumbnail TEXT,
             icon      TEXT,
             unread    INTEGER NOT NULL DEFAULT 1,
             starred   INTEGER NOT NULL DEFAULT 0,
             source    INTEGER NOT NULL,
             uid       TEXT NOT NULL,
             link      TEXT NOT NULL,
             author    TEXT
         );
         CREATE TABLE sources (
             id         INTEGER PRIMARY KEY AUTOINCREMENT,
             title      TEXT NOT NULL,
             tags       TEXT NOT NULL DEFAULT '',
             spout      TEXT NOT NULL,
             params     TEXT NOT NULL,
             error      TEXT,
             lastupdate TEXT
         );
         CREATE TABLE tags (tag TEXT NOT NULL UNIQUE, color TEXT NOT NULL);
         CREATE TABLE version (version INTEGER NOT NULL);
         INSERT INTO version (version) VALUES (1);
         INSERT INTO sources (title, tags, spout, params) VALUES ('old feed', '', 'rss', '{}');
         INSERT INTO items (datetime, title, content, source, uid, link)
             VALUES ('2020-01-01T00:00:00.000000Z', 'old', 'body', 1, 'legacy', 'http://x');",
    )
    .unwrap();
}

#[tokio::test]
async fn legacy_store_is_upgraded_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feedstore.db");
    create_legacy_v1_db(&path);

    let storage = SqliteStorage::new(&path, StoreConfig::default()).unwrap();
    assert_eq!(storage.schema_version().await.unwrap(), 5);

    // Backfilled sync columns equal the publication time.
    let item = ItemStore::get(&storage, 1).await.unwrap().expect("legacy item survived");
    assert_eq!(item.updatetime, item.datetime);
    assert_eq!(item.lastseen, item.datetime);

    // Columns added by v4 read back as NULL.
    let source = SourceStore::get(&storage, 1).await.unwrap().expect("legacy source survived");
    assert!(source.filter.is_none());
    assert!(source.lastentry.is_none());

    // The unique index from v5 is now enforced.
    let dup = ItemStore::insert(
        &storage,
        &super::item_input(1, "legacy", Utc::now()),
    )
    .await
    .expect_err("duplicate uid must now be rejected");
    assert!(dup.is_duplicate());
}

#[tokio::test]
async fn upgrading_twice_records_each_version_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feedstore.db");
    create_legacy_v1_db(&path);

    drop(SqliteStorage::new(&path, StoreConfig::default()).unwrap());
    let storage = SqliteStorage::new(&path, StoreConfig::default()).unwrap();
    assert_eq!(storage.schema_version().await.unwrap(), 5);

    let conn = Connection::open(&path).unwrap();
    let rows: i64 =
        conn.query_row("SELECT COUNT(*) FROM version", [], |row| row.get(0)).unwrap();
    assert_eq!(rows, 5);
}
