//! SourceStore implementation for the sqlite backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedstore_core::{Source, SourceInput, tag_visible, tags_from_csv, tags_to_csv};
use rusqlite::{Connection, params};

use super::tags::autocolor_sync;
use super::{SqliteStorage, get_conn, log_row_error, ts_from_row, ts_to_sql};
use crate::dialect::Dialect;
use crate::error::StorageError;
use crate::traits::SourceStore;

fn row_to_source(row: &rusqlite::Row<'_>) -> rusqlite::Result<Source> {
    let lastupdate: Option<String> = row.get(7)?;
    let lastentry: Option<String> = row.get(8)?;
    Ok(Source {
        id: row.get(0)?,
        title: row.get(1)?,
        tags: tags_from_csv(&row.get::<_, String>(2)?),
        filter: row.get(3)?,
        spout: row.get(4)?,
        params: row.get(5)?,
        error: row.get(6)?,
        lastupdate: lastupdate.as_deref().map(|s| ts_from_row(7, s)).transpose()?,
        lastentry: lastentry.as_deref().map(|s| ts_from_row(8, s)).transpose()?,
    })
}

const SOURCE_COLUMNS: &str =
    "id, title, tags, filter, spout, params, error, lastupdate, lastentry";

/// Give every tag of a freshly saved source a color row.
fn autocolor_tags(conn: &Connection, tags: &[String]) -> Result<(), StorageError> {
    for tag in tags {
        autocolor_sync(conn, tag)?;
    }
    Ok(())
}

#[async_trait]
impl SourceStore for SqliteStorage {
    async fn insert(&self, input: &SourceInput) -> Result<i64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let tags = input.normalized_tags();
        conn.execute(
            "INSERT INTO sources (title, tags, filter, spout, params) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![input.title.trim(), tags_to_csv(&tags), input.filter, input.spout, input.params],
        )?;
        let id = conn.last_insert_rowid();
        autocolor_tags(&conn, &tags)?;
        Ok(id)
    }

    async fn update(&self, id: i64, input: &SourceInput) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let tags = input.normalized_tags();
        let affected = conn.execute(
            "UPDATE sources SET title=?1, tags=?2, filter=?3, spout=?4, params=?5 WHERE id=?6",
            params![
                input.title.trim(),
                tags_to_csv(&tags),
                input.filter,
                input.spout,
                input.params,
                id
            ],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound { entity: "source", id });
        }
        autocolor_tags(&conn, &tags)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction()?;
        // No database-level cascade, for cross-engine portability.
        tx.execute("DELETE FROM items WHERE source=?1", params![id])?;
        let affected = tx.execute("DELETE FROM sources WHERE id=?1", params![id])?;
        tx.commit()?;
        if affected == 0 {
            return Err(StorageError::NotFound { entity: "source", id });
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<Source>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id=?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_source(row)?)),
            None => Ok(None),
        }
    }

    async fn all(&self, privileged: bool) -> Result<Vec<Source>, StorageError> {
        let conn = get_conn(&self.pool)?;
        // Erroring sources first so they surface, then alphabetically.
        let sql = format!(
            "SELECT {SOURCE_COLUMNS} FROM sources ORDER BY {}, LOWER(title) ASC",
            Dialect::Sqlite.order_nulls_last("error", false)
        );
        let mut stmt = conn.prepare(&sql)?;
        let sources = stmt
            .query_map([], row_to_source)?
            .filter_map(log_row_error)
            .filter(|s| privileged || s.tags.iter().all(|t| tag_visible(t, privileged)))
            .collect();
        Ok(sources)
    }

    async fn set_error(&self, id: i64, error: Option<&str>) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let error = error.filter(|e| !e.is_empty());
        conn.execute("UPDATE sources SET error=?1 WHERE id=?2", params![error, id])?;
        Ok(())
    }

    async fn save_lastupdate(&self, id: i64, at: DateTime<Utc>) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute("UPDATE sources SET lastupdate=?1 WHERE id=?2", params![ts_to_sql(at), id])?;
        Ok(())
    }

    async fn save_lastentry(&self, id: i64, at: DateTime<Utc>) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        conn.execute("UPDATE sources SET lastentry=?1 WHERE id=?2", params![ts_to_sql(at), id])?;
        Ok(())
    }

    async fn all_tags(&self) -> Result<Vec<String>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare("SELECT tags FROM sources ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut seen = std::collections::HashSet::new();
        let mut tags = Vec::new();
        for csv in rows.filter_map(log_row_error) {
            for tag in tags_from_csv(&csv) {
                if seen.insert(tag.clone()) {
                    tags.push(tag);
                }
            }
        }
        Ok(tags)
    }
}
