//! Count aggregates.

use serde::{Deserialize, Serialize};

/// Global item counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub unread: u64,
    pub starred: u64,
}

/// Unread count for one tag, with its display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUnread {
    pub tag: String,
    pub color: String,
    pub unread: u64,
}

/// Unread count for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnread {
    pub id: i64,
    pub title: String,
    pub unread: u64,
}
