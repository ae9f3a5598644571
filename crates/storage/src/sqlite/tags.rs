//! TagStore implementation for the sqlite backend.

use std::collections::HashSet;

use async_trait::async_trait;
use feedstore_core::{Tag, tag_visible};
use rusqlite::{Connection, params, params_from_iter};

use super::{SqliteStorage, get_conn, log_row_error};
use crate::aggregate::pick_unused_color;
use crate::error::StorageError;
use crate::traits::TagStore;

fn has_tag_sync(conn: &Connection, tag: &str) -> Result<bool, StorageError> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM tags WHERE tag=?1", params![tag], |row| row.get(0))?;
    Ok(count > 0)
}

fn save_color_sync(conn: &Connection, tag: &str, color: &str) -> Result<(), StorageError> {
    if has_tag_sync(conn, tag)? {
        conn.execute("UPDATE tags SET color=?1 WHERE tag=?2", params![color, tag])?;
    } else {
        conn.execute("INSERT INTO tags (tag, color) VALUES (?1, ?2)", params![tag, color])?;
    }
    Ok(())
}

/// Assign a color to a tag that has none yet; used when sources are saved.
pub(crate) fn autocolor_sync(conn: &Connection, tag: &str) -> Result<(), StorageError> {
    let tag = tag.trim();
    if tag.is_empty() || has_tag_sync(conn, tag)? {
        return Ok(());
    }
    let mut stmt = conn.prepare("SELECT color FROM tags")?;
    let used: HashSet<String> =
        stmt.query_map([], |row| row.get::<_, String>(0))?.filter_map(log_row_error).collect();
    save_color_sync(conn, tag, &pick_unused_color(tag, &used))
}

#[async_trait]
impl TagStore for SqliteStorage {
    async fn save_color(&self, tag: &str, color: &str) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        save_color_sync(&conn, tag, color)
    }

    async fn autocolor(&self, tag: &str) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        autocolor_sync(&conn, tag)
    }

    async fn all(&self, privileged: bool) -> Result<Vec<Tag>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare("SELECT tag, color FROM tags ORDER BY LOWER(tag)")?;
        let tags = stmt
            .query_map([], |row| Ok(Tag { tag: row.get(0)?, color: row.get(1)? }))?
            .filter_map(log_row_error)
            .filter(|t| tag_visible(&t.tag, privileged))
            .collect();
        Ok(tags)
    }

    async fn has_tag(&self, tag: &str) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        has_tag_sync(&conn, tag)
    }

    async fn cleanup(&self, active: &[String]) -> Result<u64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let affected = if active.is_empty() {
            conn.execute("DELETE FROM tags", [])?
        } else {
            let placeholders = active.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!("DELETE FROM tags WHERE tag NOT IN ({placeholders})");
            conn.execute(&sql, params_from_iter(active.iter()))?
        };
        Ok(affected as u64)
    }
}
