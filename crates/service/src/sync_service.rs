//! The delta-synchronization coordinator.
//!
//! One request carries a client's offline status changes plus its
//! cursors; the response carries everything that changed on the server
//! since. The processing order is fixed: client statuses land first so
//! the deltas computed afterwards already reflect them.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use feedstore_core::{StoreConfig, SyncRequest, SyncResponse, validate_ids};
use feedstore_storage::{ItemStore, StatsStore, StorageBackend};

use crate::error::ServiceError;

#[derive(Clone)]
pub struct SyncService {
    storage: Arc<StorageBackend>,
    config: StoreConfig,
}

impl SyncService {
    pub fn new(storage: Arc<StorageBackend>, config: StoreConfig) -> Self {
        Self { storage, config }
    }

    pub async fn sync(
        &self,
        request: &SyncRequest,
        privileged: bool,
    ) -> Result<SyncResponse, ServiceError> {
        // Reject malformed ids before touching storage.
        if !request.updated_statuses.is_empty() {
            let ids: Vec<i64> = request.updated_statuses.iter().map(|u| u.id).collect();
            validate_ids(&ids)?;
        }

        // 1. Client statuses first, last-writer-wins per item, the whole
        // batch in one transaction. A discarded update is the conflict
        // rule working, not a failure.
        if !request.updated_statuses.is_empty() {
            let applied = self.storage.apply_status_updates(&request.updated_statuses).await?;
            for (update, applied) in request.updated_statuses.iter().zip(applied) {
                if !applied {
                    tracing::info!(
                        item = update.id,
                        client_time = %update.datetime,
                        "conflict ignored: stale or unknown status update"
                    );
                }
            }
        }

        // 2. New items along the id cursor.
        let mut response = SyncResponse::default();
        let mut new_ids = HashSet::new();
        response.last_id = request.items_since_id.unwrap_or(0);
        if let Some(since_id) = request.items_since_id {
            let how_many = request
                .items_how_many
                .map_or(self.config.items_per_page, |n| n.min(self.config.items_per_page_max));
            let not_before = request.items_not_before.map(|nb| {
                if self.config.retention_days > 0 {
                    let horizon =
                        Utc::now() - Duration::days(i64::from(self.config.retention_days));
                    if nb < horizon {
                        // The client expects items the server may already
                        // have pruned; it has to drop its cursor.
                        tracing::info!(
                            requested = %nb,
                            horizon = %horizon,
                            "cutoff behind retention window, requesting full resync"
                        );
                        response.resync_required = true;
                        return horizon;
                    }
                }
                nb
            });
            response.new_items =
                self.storage.items_since_id(since_id, not_before, how_many).await?;
            if let Some(last) = response.new_items.last() {
                response.last_id = last.id;
            }
            new_ids.extend(response.new_items.iter().map(|i| i.id));
        }

        // 3. Status deltas, minus items the client just received in full.
        if let Some(since) = request.since {
            response.item_updates = self
                .storage
                .statuses_changed_since(since)
                .await?
                .into_iter()
                .filter(|change| !new_ids.contains(&change.id))
                .collect();
        }

        // 4. Optional aggregates.
        if request.want_stats {
            response.stats = Some(self.storage.stats(privileged).await?);
        }
        if request.want_tags {
            response.tags = Some(self.storage.unread_by_tag(privileged).await?);
        }
        if request.want_sources {
            response.sources = Some(self.storage.unread_by_source(privileged).await?);
        }

        // 5. Timestamp cursor for the next round.
        response.last_update = self.storage.last_update().await?;
        Ok(response)
    }
}
