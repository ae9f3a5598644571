//! SourceStore implementation for the mysql backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedstore_core::{Source, SourceInput, tag_visible, tags_from_csv, tags_to_csv};
use sqlx::Row as _;
use sqlx::mysql::MySqlRow;

use super::MysqlStorage;
use super::tags::autocolor_on;
use crate::dialect::Dialect;
use crate::error::StorageError;
use crate::traits::SourceStore;

const SOURCE_COLUMNS: &str =
    "id, title, tags, filter, spout, params, error, lastupdate, lastentry";

fn row_to_source(row: &MySqlRow) -> Result<Source, StorageError> {
    let tags: String = row.try_get("tags")?;
    Ok(Source {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        tags: tags_from_csv(&tags),
        filter: row.try_get("filter")?,
        spout: row.try_get("spout")?,
        params: row.try_get("params")?,
        error: row.try_get("error")?,
        lastupdate: row.try_get("lastupdate")?,
        lastentry: row.try_get("lastentry")?,
    })
}

impl MysqlStorage {
    async fn autocolor_tags(&self, tags: &[String]) -> Result<(), StorageError> {
        for tag in tags {
            autocolor_on(&self.pool, tag).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SourceStore for MysqlStorage {
    async fn insert(&self, input: &SourceInput) -> Result<i64, StorageError> {
        let tags = input.normalized_tags();
        let result = sqlx::query(
            "INSERT INTO sources (title, tags, filter, spout, params) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(input.title.trim())
        .bind(tags_to_csv(&tags))
        .bind(&input.filter)
        .bind(&input.spout)
        .bind(&input.params)
        .execute(&self.pool)
        .await?;
        self.autocolor_tags(&tags).await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn update(&self, id: i64, input: &SourceInput) -> Result<(), StorageError> {
        let tags = input.normalized_tags();
        let result = sqlx::query(
            "UPDATE sources SET title=?, tags=?, filter=?, spout=?, params=? WHERE id=?",
        )
        .bind(input.title.trim())
        .bind(tags_to_csv(&tags))
        .bind(&input.filter)
        .bind(&input.spout)
        .bind(&input.params)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "source", id });
        }
        self.autocolor_tags(&tags).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        // No database-level cascade, for cross-engine portability.
        sqlx::query("DELETE FROM items WHERE source=?").bind(id).execute(&mut *tx).await?;
        let result =
            sqlx::query("DELETE FROM sources WHERE id=?").bind(id).execute(&mut *tx).await?;
        tx.commit().await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound { entity: "source", id });
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> Result<Option<Source>, StorageError> {
        let sql = format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id=?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_source).transpose()
    }

    async fn all(&self, privileged: bool) -> Result<Vec<Source>, StorageError> {
        let sql = format!(
            "SELECT {SOURCE_COLUMNS} FROM sources ORDER BY {}, LOWER(title) ASC",
            Dialect::Mysql.order_nulls_last("error", false)
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut sources = Vec::with_capacity(rows.len());
        for row in &rows {
            let source = row_to_source(row)?;
            if privileged || source.tags.iter().all(|t| tag_visible(t, privileged)) {
                sources.push(source);
            }
        }
        Ok(sources)
    }

    async fn set_error(&self, id: i64, error: Option<&str>) -> Result<(), StorageError> {
        let error = error.filter(|e| !e.is_empty());
        sqlx::query("UPDATE sources SET error=? WHERE id=?")
            .bind(error)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_lastupdate(&self, id: i64, at: DateTime<Utc>) -> Result<(), StorageError> {
        sqlx::query("UPDATE sources SET lastupdate=? WHERE id=?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_lastentry(&self, id: i64, at: DateTime<Utc>) -> Result<(), StorageError> {
        sqlx::query("UPDATE sources SET lastentry=? WHERE id=?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn all_tags(&self) -> Result<Vec<String>, StorageError> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT tags FROM sources ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        let mut seen = std::collections::HashSet::new();
        let mut tags = Vec::new();
        for csv in &rows {
            for tag in tags_from_csv(csv) {
                if seen.insert(tag.clone()) {
                    tags.push(tag);
                }
            }
        }
        Ok(tags)
    }
}
