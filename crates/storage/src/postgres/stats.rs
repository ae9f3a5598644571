//! StatsStore implementation for the postgres backend.

use std::collections::HashMap;

use async_trait::async_trait;
use feedstore_core::{
    HIDDEN_TAG_MARKER, PRIVATE_TAG_MARKER, SourceUnread, Stats, TagUnread, tag_visible,
    tags_from_csv,
};
use sqlx::PgPool;

use super::PgStorage;
use crate::aggregate::fold_unread_by_tag;
use crate::dialect::Dialect;
use crate::error::StorageError;
use crate::traits::StatsStore;

/// Subquery selecting sources carrying a tag that starts with `marker`.
fn marked_sources(marker: char) -> String {
    format!(
        "SELECT id FROM sources WHERE {}",
        Dialect::Postgres.csv_has_marker("tags", marker)
    )
}

async fn hidden_unread(pool: &PgPool, privacy_clause: &str) -> Result<u64, StorageError> {
    let sql = format!(
        "SELECT COUNT(*) FROM items WHERE {}{privacy_clause} AND source IN ({})",
        Dialect::Postgres.is_true("unread"),
        marked_sources(HIDDEN_TAG_MARKER)
    );
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count.max(0) as u64)
}

impl PgStorage {
    fn privacy_clause(privileged: bool) -> String {
        if privileged {
            String::new()
        } else {
            format!(" AND source NOT IN ({})", marked_sources(PRIVATE_TAG_MARKER))
        }
    }
}

#[async_trait]
impl StatsStore for PgStorage {
    async fn stats(&self, privileged: bool) -> Result<Stats, StorageError> {
        let privacy = Self::privacy_clause(privileged);
        let sql = format!(
            "SELECT COUNT(*), COALESCE({}, 0), COALESCE({}, 0) \
             FROM items WHERE 1=1{privacy}",
            Dialect::Postgres.sum_bool("unread"),
            Dialect::Postgres.sum_bool("starred")
        );
        let (total, unread, starred): (i64, i64, i64) =
            sqlx::query_as(&sql).fetch_one(&self.pool).await?;

        // Hidden-tag unread counts never compete with ordinary unread.
        let hidden = hidden_unread(&self.pool, &privacy).await?;
        Ok(Stats {
            total: total.max(0) as u64,
            unread: (unread.max(0) as u64).saturating_sub(hidden),
            starred: starred.max(0) as u64,
        })
    }

    async fn unread_by_tag(&self, privileged: bool) -> Result<Vec<TagUnread>, StorageError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT sources.tags, COUNT(items.id) FROM sources \
             LEFT JOIN items ON items.source=sources.id AND items.unread=true \
             GROUP BY sources.id, sources.tags",
        )
        .fetch_all(&self.pool)
        .await?;
        let per_source: Vec<(Vec<String>, u64)> = rows
            .into_iter()
            .map(|(csv, unread)| (tags_from_csv(&csv), unread.max(0) as u64))
            .collect();

        let colors: HashMap<String, String> = sqlx::query_as("SELECT tag, color FROM tags")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .collect();

        Ok(fold_unread_by_tag(&per_source, &colors, privileged))
    }

    async fn unread_by_source(&self, privileged: bool) -> Result<Vec<SourceUnread>, StorageError> {
        let rows: Vec<(i64, String, String, i64)> = sqlx::query_as(
            "SELECT sources.id, sources.title, sources.tags, COUNT(items.id) FROM sources \
             LEFT JOIN items ON items.source=sources.id AND items.unread=true \
             GROUP BY sources.id, sources.title, sources.tags \
             ORDER BY LOWER(sources.title)",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter(|(_, _, csv, _)| {
                privileged || tags_from_csv(csv).iter().all(|t| tag_visible(t, privileged))
            })
            .map(|(id, title, _, unread)| SourceUnread { id, title, unread: unread.max(0) as u64 })
            .collect())
    }
}
