//! Feed subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured subscription feeding items via an acquisition strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub title: String,
    /// Ordered tag names, stored as a comma-separated string in the tags
    /// column and split on read.
    pub tags: Vec<String>,
    /// Optional filter expression consumed by the (external) filter language.
    pub filter: Option<String>,
    /// Acquisition strategy identifier, opaque to the storage core.
    pub spout: String,
    /// Serialized configuration for the spout.
    pub params: String,
    /// Last acquisition error, cleared on a successful poll.
    pub error: Option<String>,
    pub lastupdate: Option<DateTime<Utc>>,
    /// Publication time of the newest item ever seen on this source, used
    /// to recognize long-dead feeds.
    pub lastentry: Option<DateTime<Utc>>,
}

/// User-editable fields of a source, used for both insert and edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInput {
    pub title: String,
    pub tags: Vec<String>,
    pub filter: Option<String>,
    pub spout: String,
    pub params: String,
}

impl SourceInput {
    /// Normalized tag list: trimmed, empties dropped, order preserved.
    pub fn normalized_tags(&self) -> Vec<String> {
        normalize_tags(&self.tags)
    }
}

/// Trim tag names and drop empty entries, preserving order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).map(str::to_owned).collect()
}

/// Join a tag list into its CSV column representation.
pub fn tags_to_csv(tags: &[String]) -> String {
    normalize_tags(tags).join(",")
}

/// Split a CSV tags column into an ordered tag list.
pub fn tags_from_csv(csv: &str) -> Vec<String> {
    csv.split(',').map(str::trim).filter(|t| !t.is_empty()).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip_drops_empties_and_whitespace() {
        let tags = vec![" news ".to_owned(), String::new(), "tech".to_owned()];
        assert_eq!(tags_to_csv(&tags), "news,tech");
        assert_eq!(tags_from_csv("news, tech,,"), vec!["news", "tech"]);
    }
}
