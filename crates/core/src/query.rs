//! Typed query options for the item read path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status filter on the item list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Unread,
    Starred,
}

/// Sort direction for unread-only listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Fully validated filter parameters for one item list query.
///
/// Built by the service layer from raw request input; the storage layer
/// assumes `offset`/`limit` are already range-checked and capped.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub offset: u32,
    pub limit: u32,
    /// Free-text search, split into AND-combined case-insensitive terms.
    pub search: Option<String>,
    /// Tag filter. Takes precedence over `source` when both are set.
    pub tag: Option<String>,
    pub source: Option<i64>,
    pub status: Option<StatusFilter>,
    /// Only items whose updatetime is strictly greater than this.
    pub updated_since: Option<DateTime<Utc>>,
    /// Privileged callers see privacy-marked content.
    pub privileged: bool,
}

/// Split a free-text search string into terms.
///
/// Terms are whitespace-separated; empty terms are dropped. Matching is
/// case-insensitive, so terms are lowercased here once.
pub fn split_search_terms(search: &str) -> Vec<String> {
    search.split_whitespace().map(str::to_lowercase).collect()
}
