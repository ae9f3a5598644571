//! TagStore implementation for the mysql backend.

use std::collections::HashSet;

use async_trait::async_trait;
use feedstore_core::{Tag, tag_visible};
use sqlx::MySqlPool;

use super::MysqlStorage;
use crate::aggregate::pick_unused_color;
use crate::error::StorageError;
use crate::traits::TagStore;

async fn has_tag_on(pool: &MySqlPool, tag: &str) -> Result<bool, StorageError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE tag=?")
        .bind(tag)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

async fn save_color_on(pool: &MySqlPool, tag: &str, color: &str) -> Result<(), StorageError> {
    if has_tag_on(pool, tag).await? {
        sqlx::query("UPDATE tags SET color=? WHERE tag=?")
            .bind(color)
            .bind(tag)
            .execute(pool)
            .await?;
    } else {
        sqlx::query("INSERT INTO tags (tag, color) VALUES (?, ?)")
            .bind(tag)
            .bind(color)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Assign a color to a tag that has none yet; used when sources are saved.
pub(crate) async fn autocolor_on(pool: &MySqlPool, tag: &str) -> Result<(), StorageError> {
    let tag = tag.trim();
    if tag.is_empty() || has_tag_on(pool, tag).await? {
        return Ok(());
    }
    let used: HashSet<String> = sqlx::query_scalar("SELECT color FROM tags")
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();
    save_color_on(pool, tag, &pick_unused_color(tag, &used)).await
}

#[async_trait]
impl TagStore for MysqlStorage {
    async fn save_color(&self, tag: &str, color: &str) -> Result<(), StorageError> {
        save_color_on(&self.pool, tag, color).await
    }

    async fn autocolor(&self, tag: &str) -> Result<(), StorageError> {
        autocolor_on(&self.pool, tag).await
    }

    async fn all(&self, privileged: bool) -> Result<Vec<Tag>, StorageError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT tag, color FROM tags ORDER BY LOWER(tag)")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|(tag, color)| Tag { tag, color })
            .filter(|t| tag_visible(&t.tag, privileged))
            .collect())
    }

    async fn has_tag(&self, tag: &str) -> Result<bool, StorageError> {
        has_tag_on(&self.pool, tag).await
    }

    async fn cleanup(&self, active: &[String]) -> Result<u64, StorageError> {
        let result = if active.is_empty() {
            sqlx::query("DELETE FROM tags").execute(&self.pool).await?
        } else {
            let placeholders = active.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!("DELETE FROM tags WHERE tag NOT IN ({placeholders})");
            let mut query = sqlx::query(&sql);
            for tag in active {
                query = query.bind(tag);
            }
            query.execute(&self.pool).await?
        };
        Ok(result.rows_affected())
    }
}
