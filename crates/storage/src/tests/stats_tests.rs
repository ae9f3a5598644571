use chrono::Utc;

use super::{seed_item, seed_source, test_storage};
use crate::traits::{ItemStore, StatsStore, TagStore};

#[tokio::test]
async fn stats_count_total_unread_and_starred() {
    let t = test_storage();
    let source = seed_source(&t.storage, "feed", &[]).await;
    let read = seed_item(&t.storage, source, "a", Utc::now()).await;
    let starred = seed_item(&t.storage, source, "b", Utc::now()).await;
    seed_item(&t.storage, source, "c", Utc::now()).await;
    t.storage.set_unread(&[read], false).await.unwrap();
    t.storage.set_starred(starred, true).await.unwrap();

    let stats = t.storage.stats(true).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.unread, 2);
    assert_eq!(stats.starred, 1);
}

#[tokio::test]
async fn hidden_tag_unread_is_excluded_from_the_global_count() {
    let t = test_storage();
    let muted = seed_source(&t.storage, "firehose", &["#muted"]).await;
    let normal = seed_source(&t.storage, "news", &[]).await;
    seed_item(&t.storage, muted, "m1", Utc::now()).await;
    seed_item(&t.storage, muted, "m2", Utc::now()).await;
    seed_item(&t.storage, normal, "n", Utc::now()).await;

    let stats = t.storage.stats(true).await.unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.unread, 1);
}

#[tokio::test]
async fn private_sources_are_excluded_for_unprivileged_callers() {
    let t = test_storage();
    let private = seed_source(&t.storage, "diary", &["@personal"]).await;
    let public = seed_source(&t.storage, "news", &[]).await;
    seed_item(&t.storage, private, "p", Utc::now()).await;
    seed_item(&t.storage, public, "q", Utc::now()).await;

    let anon = t.storage.stats(false).await.unwrap();
    assert_eq!(anon.total, 1);
    assert_eq!(anon.unread, 1);

    let full = t.storage.stats(true).await.unwrap();
    assert_eq!(full.total, 2);
}

#[tokio::test]
async fn unread_by_tag_sums_across_sources_and_carries_colors() {
    let t = test_storage();
    let a = seed_source(&t.storage, "a", &["news", "tech"]).await;
    let b = seed_source(&t.storage, "b", &["news"]).await;
    seed_item(&t.storage, a, "a1", Utc::now()).await;
    seed_item(&t.storage, b, "b1", Utc::now()).await;
    seed_item(&t.storage, b, "b2", Utc::now()).await;
    t.storage.save_color("news", "#ff0000").await.unwrap();

    let by_tag = t.storage.unread_by_tag(true).await.unwrap();
    let news = by_tag.iter().find(|t| t.tag == "news").expect("news present");
    assert_eq!(news.unread, 3);
    assert_eq!(news.color, "#ff0000");
    let tech = by_tag.iter().find(|t| t.tag == "tech").expect("tech present");
    assert_eq!(tech.unread, 1);
}

#[tokio::test]
async fn unread_by_tag_includes_tags_with_no_unread_items() {
    let t = test_storage();
    let source = seed_source(&t.storage, "feed", &["quiet"]).await;
    let id = seed_item(&t.storage, source, "a", Utc::now()).await;
    t.storage.set_unread(&[id], false).await.unwrap();

    let by_tag = t.storage.unread_by_tag(true).await.unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].tag, "quiet");
    assert_eq!(by_tag[0].unread, 0);
}

#[tokio::test]
async fn unread_by_tag_hides_private_tags_from_unprivileged_callers() {
    let t = test_storage();
    let source = seed_source(&t.storage, "feed", &["@personal", "news"]).await;
    seed_item(&t.storage, source, "a", Utc::now()).await;

    let anon = t.storage.unread_by_tag(false).await.unwrap();
    assert_eq!(anon.iter().map(|t| t.tag.as_str()).collect::<Vec<_>>(), vec!["news"]);

    let full = t.storage.unread_by_tag(true).await.unwrap();
    assert_eq!(full.len(), 2);
}

#[tokio::test]
async fn unread_by_source_orders_by_lowercase_title() {
    let t = test_storage();
    let b = seed_source(&t.storage, "beta", &[]).await;
    let a = seed_source(&t.storage, "Alpha", &[]).await;
    seed_item(&t.storage, b, "b1", Utc::now()).await;

    let by_source = t.storage.unread_by_source(true).await.unwrap();
    assert_eq!(by_source.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a, b]);
    assert_eq!(by_source[0].unread, 0);
    assert_eq!(by_source[1].unread, 1);
}
