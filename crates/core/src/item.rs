//! Stored content items and their acquisition-facing input shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored piece of content with its read/starred state.
///
/// `source_title` and `tags` are denormalized from the owning source when
/// rows are read, so a page of entries can be serialized without another
/// lookup by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub datetime: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub unread: bool,
    pub starred: bool,
    pub source: i64,
    pub thumbnail: Option<String>,
    pub icon: Option<String>,
    /// Source-provided stable identifier, unique within a source.
    pub uid: String,
    pub link: String,
    pub author: Option<String>,
    /// Advanced whenever `unread` or `starred` changes, never by content
    /// refresh. Drives delta synchronization.
    pub updatetime: DateTime<Utc>,
    /// Refreshed while the acquisition process still sees the item in its
    /// feed; consulted by retention cleanup. Server-internal, so it is not
    /// serialized and defaults to now when absent on the wire.
    #[serde(skip_serializing, default = "Utc::now")]
    pub lastseen: DateTime<Utc>,
    #[serde(rename = "sourcetitle")]
    pub source_title: String,
    pub tags: Vec<String>,
}

/// A normalized item handed over by content acquisition for insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInput {
    pub datetime: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub source: i64,
    pub thumbnail: Option<String>,
    pub icon: Option<String>,
    pub uid: String,
    pub link: String,
    pub author: Option<String>,
}

/// One page of items plus the bounded-lookahead continuation flag.
#[derive(Debug, Clone, Serialize)]
pub struct ItemPage {
    pub entries: Vec<Item>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> Item {
        let at = "2024-03-01T12:00:00Z".parse().unwrap();
        Item {
            id: 7,
            datetime: at,
            title: "title".to_owned(),
            content: "content".to_owned(),
            unread: true,
            starred: false,
            source: 3,
            thumbnail: None,
            icon: None,
            uid: "uid-7".to_owned(),
            link: "https://example.com/7".to_owned(),
            author: None,
            updatetime: at,
            lastseen: at,
            source_title: "Example Feed".to_owned(),
            tags: vec!["news".to_owned()],
        }
    }

    #[test]
    fn item_wire_shape_hides_lastseen() {
        let json = serde_json::to_value(sample_item()).unwrap();
        assert!(json.get("lastseen").is_none());
        assert_eq!(json["sourcetitle"], "Example Feed");
        assert_eq!(json["uid"], "uid-7");
    }

    #[test]
    fn item_parses_without_lastseen() {
        // The wire shape produced above never carries lastseen, so parsing
        // it back exercises the default.
        let json = serde_json::to_value(sample_item()).unwrap();
        let parsed: Item = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.id, 7);
        assert!(parsed.lastseen >= parsed.updatetime);
    }

    #[test]
    fn page_serializes_the_continuation_flag_in_camel_case() {
        let page = ItemPage { entries: vec![sample_item()], has_more: true };
        let json = serde_json::to_value(page).unwrap();
        assert_eq!(json["hasMore"], true);
        assert_eq!(json["entries"][0]["id"], 7);
    }
}
