//! Tags and the reserved visibility markers.

use serde::{Deserialize, Serialize};

/// Tags starting with this marker are excluded from anonymous/public views.
pub const PRIVATE_TAG_MARKER: char = '@';

/// Tags starting with this marker are excluded from aggregate unread counts
/// so they never visually compete with ordinary unread items.
pub const HIDDEN_TAG_MARKER: char = '#';

/// A tag name with its display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub tag: String,
    pub color: String,
}

/// Whether a tag is hidden from non-privileged callers entirely.
pub fn is_private_tag(tag: &str) -> bool {
    tag.starts_with(PRIVATE_TAG_MARKER)
}

/// Whether a tag is excluded from unread aggregates.
pub fn is_hidden_tag(tag: &str) -> bool {
    tag.starts_with(HIDDEN_TAG_MARKER)
}

/// Whether a tag may appear in listings for the given caller.
///
/// Private tags require privilege; hidden tags are visible in listings
/// (they are only removed from unread aggregates).
pub fn tag_visible(tag: &str, privileged: bool) -> bool {
    privileged || !is_private_tag(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_classify_tags() {
        assert!(is_private_tag("@personal"));
        assert!(!is_private_tag("news"));
        assert!(is_hidden_tag("#muted"));
        assert!(!is_hidden_tag("news"));
    }

    #[test]
    fn private_tags_need_privilege() {
        assert!(tag_visible("@personal", true));
        assert!(!tag_visible("@personal", false));
        assert!(tag_visible("#muted", false));
        assert!(tag_visible("news", false));
    }
}
