//! Delta-synchronization wire shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Item, SourceUnread, Stats, TagUnread};

/// One client-submitted status change made while offline.
///
/// `datetime` is the client-side time of the change and is compared against
/// the item's stored `updatetime` for last-writer-wins resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starred: Option<bool>,
    pub datetime: DateTime<Utc>,
}

/// Status of one item as reported in `item_updates`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatusChange {
    pub id: i64,
    pub unread: bool,
    pub starred: bool,
}

/// A client's "what changed since X" request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Offline status changes to apply before computing deltas.
    #[serde(rename = "updatedStatuses", default)]
    pub updated_statuses: Vec<StatusUpdate>,
    /// Last server timestamp the client knows about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Highest item id the client has.
    #[serde(rename = "itemsSinceId", skip_serializing_if = "Option::is_none")]
    pub items_since_id: Option<i64>,
    /// Lower cutoff matching the client's own retention pruning.
    #[serde(rename = "itemsNotBefore", skip_serializing_if = "Option::is_none")]
    pub items_not_before: Option<DateTime<Utc>>,
    /// Cap on returned new items.
    #[serde(rename = "itemsHowMany", skip_serializing_if = "Option::is_none")]
    pub items_how_many: Option<u32>,
    #[serde(rename = "wantTags", default)]
    pub want_tags: bool,
    #[serde(rename = "wantSources", default)]
    pub want_sources: bool,
    #[serde(rename = "wantStats", default)]
    pub want_stats: bool,
}

/// The server's answer to one sync request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(rename = "newItems")]
    pub new_items: Vec<Item>,
    /// Id cursor for the next request: last returned item id, or the
    /// previous cursor when no new items were returned.
    #[serde(rename = "lastId")]
    pub last_id: i64,
    /// Timestamp cursor for the next request.
    #[serde(rename = "lastUpdate", skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    /// Statuses changed since `since`, excluding ids already in `new_items`.
    #[serde(rename = "itemUpdates")]
    pub item_updates: Vec<ItemStatusChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagUnread>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceUnread>>,
    /// Set when the client's `items_not_before` falls behind the server's
    /// retention window: items it expects may already be pruned, so it must
    /// drop its cursor and resynchronize from scratch.
    #[serde(rename = "resyncRequired", default, skip_serializing_if = "std::ops::Not::not")]
    pub resync_required: bool,
}
