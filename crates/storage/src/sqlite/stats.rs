//! StatsStore implementation for the sqlite backend.

use std::collections::HashMap;

use async_trait::async_trait;
use feedstore_core::{HIDDEN_TAG_MARKER, PRIVATE_TAG_MARKER, SourceUnread, Stats, TagUnread, tag_visible, tags_from_csv};
use rusqlite::{Connection, params};

use super::{SqliteStorage, get_conn, log_row_error};
use crate::aggregate::fold_unread_by_tag;
use crate::dialect::Dialect;
use crate::error::StorageError;
use crate::traits::StatsStore;

/// Subquery selecting sources carrying a tag that starts with `marker`.
fn marked_sources(marker: char) -> String {
    format!(
        "SELECT id FROM sources WHERE {}",
        Dialect::Sqlite.csv_has_marker("tags", marker)
    )
}

fn hidden_unread(conn: &Connection, privacy_clause: &str) -> Result<u64, StorageError> {
    let sql = format!(
        "SELECT COUNT(*) FROM items WHERE {}{privacy_clause} AND source IN ({})",
        Dialect::Sqlite.is_true("unread"),
        marked_sources(HIDDEN_TAG_MARKER)
    );
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

impl SqliteStorage {
    fn privacy_clause(privileged: bool) -> String {
        if privileged {
            String::new()
        } else {
            format!(" AND source NOT IN ({})", marked_sources(PRIVATE_TAG_MARKER))
        }
    }
}

#[async_trait]
impl StatsStore for SqliteStorage {
    async fn stats(&self, privileged: bool) -> Result<Stats, StorageError> {
        let conn = get_conn(&self.pool)?;
        let privacy = Self::privacy_clause(privileged);
        let sql = format!(
            "SELECT COUNT(*), COALESCE({}, 0), COALESCE({}, 0) \
             FROM items WHERE 1=1{privacy}",
            Dialect::Sqlite.sum_bool("unread"),
            Dialect::Sqlite.sum_bool("starred")
        );
        let (total, unread, starred): (i64, i64, i64) =
            conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;

        // Hidden-tag unread counts never compete with ordinary unread.
        let hidden = hidden_unread(&conn, &privacy)?;
        Ok(Stats {
            total: total.max(0) as u64,
            unread: (unread.max(0) as u64).saturating_sub(hidden),
            starred: starred.max(0) as u64,
        })
    }

    async fn unread_by_tag(&self, privileged: bool) -> Result<Vec<TagUnread>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT sources.tags, COUNT(items.id) FROM sources \
             LEFT JOIN items ON items.source=sources.id AND items.unread=1 \
             GROUP BY sources.id, sources.tags",
        )?;
        let per_source: Vec<(Vec<String>, u64)> = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .filter_map(log_row_error)
            .map(|(csv, unread)| (tags_from_csv(&csv), unread.max(0) as u64))
            .collect();

        let mut stmt = conn.prepare("SELECT tag, color FROM tags")?;
        let colors: HashMap<String, String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .filter_map(log_row_error)
            .collect();

        Ok(fold_unread_by_tag(&per_source, &colors, privileged))
    }

    async fn unread_by_source(&self, privileged: bool) -> Result<Vec<SourceUnread>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT sources.id, sources.title, sources.tags, COUNT(items.id) FROM sources \
             LEFT JOIN items ON items.source=sources.id AND items.unread=1 \
             GROUP BY sources.id, sources.title, sources.tags \
             ORDER BY LOWER(sources.title)",
        )?;
        let result = stmt
            .query_map(params![], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .filter_map(log_row_error)
            .filter(|(_, _, csv, _)| {
                privileged || tags_from_csv(csv).iter().all(|t| tag_visible(t, privileged))
            })
            .map(|(id, title, _, unread)| SourceUnread { id, title, unread: unread.max(0) as u64 })
            .collect();
        Ok(result)
    }
}
