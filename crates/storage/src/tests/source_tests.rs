use chrono::Utc;
use feedstore_core::SourceInput;

use super::{seed_item, seed_source, test_storage};
use crate::error::StorageError;
use crate::traits::{ItemStore, SourceStore};

fn input(title: &str, tags: &[&str]) -> SourceInput {
    SourceInput {
        title: title.to_owned(),
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        filter: None,
        spout: "rss".to_owned(),
        params: "{}".to_owned(),
    }
}

#[tokio::test]
async fn insert_and_get_roundtrip_normalizes_tags() {
    let t = test_storage();
    let id = SourceStore::insert(&t.storage, &input("  My Feed  ", &[" news ", "", "tech"]))
        .await
        .unwrap();

    let source = SourceStore::get(&t.storage, id).await.unwrap().expect("source exists");
    assert_eq!(source.title, "My Feed");
    assert_eq!(source.tags, vec!["news", "tech"]);
    assert!(source.error.is_none());
    assert!(source.lastupdate.is_none());
}

#[tokio::test]
async fn update_replaces_editable_fields() {
    let t = test_storage();
    let id = seed_source(&t.storage, "old", &["a"]).await;
    t.storage.update(id, &input("new", &["b"])).await.unwrap();

    let source = SourceStore::get(&t.storage, id).await.unwrap().unwrap();
    assert_eq!(source.title, "new");
    assert_eq!(source.tags, vec!["b"]);
}

#[tokio::test]
async fn update_missing_source_is_not_found() {
    let t = test_storage();
    let err = t.storage.update(99, &input("x", &[])).await.expect_err("must fail");
    assert!(matches!(err, StorageError::NotFound { entity: "source", id: 99 }));
}

#[tokio::test]
async fn delete_removes_the_source_and_its_items() {
    let t = test_storage();
    let doomed = seed_source(&t.storage, "doomed", &[]).await;
    let kept = seed_source(&t.storage, "kept", &[]).await;
    let doomed_item = seed_item(&t.storage, doomed, "a", Utc::now()).await;
    let kept_item = seed_item(&t.storage, kept, "b", Utc::now()).await;

    SourceStore::delete(&t.storage, doomed).await.unwrap();

    assert!(SourceStore::get(&t.storage, doomed).await.unwrap().is_none());
    assert!(ItemStore::get(&t.storage, doomed_item).await.unwrap().is_none());
    assert!(ItemStore::get(&t.storage, kept_item).await.unwrap().is_some());
}

#[tokio::test]
async fn all_orders_erroring_sources_first() {
    let t = test_storage();
    let healthy = seed_source(&t.storage, "beta", &[]).await;
    let broken = seed_source(&t.storage, "alpha", &[]).await;
    t.storage.set_error(broken, Some("connection refused")).await.unwrap();

    let sources = SourceStore::all(&t.storage, true).await.unwrap();
    let ids: Vec<i64> = sources.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![broken, healthy]);
    assert_eq!(sources[0].error.as_deref(), Some("connection refused"));
}

#[tokio::test]
async fn set_error_with_empty_string_clears_it() {
    let t = test_storage();
    let id = seed_source(&t.storage, "feed", &[]).await;
    t.storage.set_error(id, Some("boom")).await.unwrap();
    t.storage.set_error(id, Some("")).await.unwrap();

    let source = SourceStore::get(&t.storage, id).await.unwrap().unwrap();
    assert!(source.error.is_none());
}

#[tokio::test]
async fn private_sources_are_invisible_without_privilege() {
    let t = test_storage();
    seed_source(&t.storage, "diary", &["@personal"]).await;
    let public = seed_source(&t.storage, "news", &["news"]).await;

    let anon = SourceStore::all(&t.storage, false).await.unwrap();
    assert_eq!(anon.iter().map(|s| s.id).collect::<Vec<_>>(), vec![public]);

    let all = SourceStore::all(&t.storage, true).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn poll_bookkeeping_persists() {
    let t = test_storage();
    let id = seed_source(&t.storage, "feed", &[]).await;
    let item = seed_item(&t.storage, id, "a", Utc::now()).await;
    let at = ItemStore::get(&t.storage, item).await.unwrap().unwrap().datetime;

    t.storage.save_lastupdate(id, at).await.unwrap();
    t.storage.save_lastentry(id, at).await.unwrap();

    let source = SourceStore::get(&t.storage, id).await.unwrap().unwrap();
    assert_eq!(source.lastupdate, Some(at));
    assert_eq!(source.lastentry, Some(at));
}

#[tokio::test]
async fn all_tags_preserves_first_use_order() {
    let t = test_storage();
    seed_source(&t.storage, "one", &["zeta", "alpha"]).await;
    seed_source(&t.storage, "two", &["alpha", "mid"]).await;

    let tags = t.storage.all_tags().await.unwrap();
    assert_eq!(tags, vec!["zeta", "alpha", "mid"]);
}
