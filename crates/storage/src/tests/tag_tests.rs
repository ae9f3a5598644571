use super::{seed_source, test_storage};
use crate::traits::TagStore;

#[tokio::test]
async fn saving_a_source_autocolors_its_tags() {
    let t = test_storage();
    seed_source(&t.storage, "feed", &["news", "tech"]).await;

    let tags = TagStore::all(&t.storage, true).await.unwrap();
    assert_eq!(tags.len(), 2);
    for tag in &tags {
        assert!(tag.color.starts_with('#'), "got {:?}", tag.color);
    }
    // Ordered by lowercase name.
    assert_eq!(tags[0].tag, "news");
    assert_eq!(tags[1].tag, "tech");
}

#[tokio::test]
async fn autocolor_is_deterministic_and_does_not_reassign() {
    let t = test_storage();
    t.storage.autocolor("news").await.unwrap();
    let first = TagStore::all(&t.storage, true).await.unwrap()[0].color.clone();

    t.storage.autocolor("news").await.unwrap();
    let second = TagStore::all(&t.storage, true).await.unwrap()[0].color.clone();
    assert_eq!(first, second);

    // And a second store assigns the same color to the same tag.
    let other = test_storage();
    other.storage.autocolor("news").await.unwrap();
    assert_eq!(TagStore::all(&other.storage, true).await.unwrap()[0].color, first);
}

#[tokio::test]
async fn autocolor_skips_blank_tags() {
    let t = test_storage();
    t.storage.autocolor("  ").await.unwrap();
    assert!(TagStore::all(&t.storage, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn save_color_overrides_an_assigned_color() {
    let t = test_storage();
    t.storage.autocolor("news").await.unwrap();
    t.storage.save_color("news", "#123456").await.unwrap();

    let tags = TagStore::all(&t.storage, true).await.unwrap();
    assert_eq!(tags[0].color, "#123456");
    assert!(t.storage.has_tag("news").await.unwrap());
    assert!(!t.storage.has_tag("other").await.unwrap());
}

#[tokio::test]
async fn private_tags_are_listed_only_for_privileged_callers() {
    let t = test_storage();
    t.storage.autocolor("@personal").await.unwrap();
    t.storage.autocolor("news").await.unwrap();

    let anon: Vec<String> = TagStore::all(&t.storage, false)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.tag)
        .collect();
    assert_eq!(anon, vec!["news"]);

    assert_eq!(TagStore::all(&t.storage, true).await.unwrap().len(), 2);
}

#[tokio::test]
async fn cleanup_drops_colors_of_unreferenced_tags() {
    let t = test_storage();
    t.storage.autocolor("kept").await.unwrap();
    t.storage.autocolor("stale").await.unwrap();

    let removed = TagStore::cleanup(&t.storage, &["kept".to_owned()]).await.unwrap();
    assert_eq!(removed, 1);
    assert!(t.storage.has_tag("kept").await.unwrap());
    assert!(!t.storage.has_tag("stale").await.unwrap());
}

#[tokio::test]
async fn cleanup_with_no_active_tags_clears_everything() {
    let t = test_storage();
    t.storage.autocolor("a").await.unwrap();
    t.storage.autocolor("b").await.unwrap();

    let removed = TagStore::cleanup(&t.storage, &[]).await.unwrap();
    assert_eq!(removed, 2);
    assert!(TagStore::all(&t.storage, true).await.unwrap().is_empty());
}
