//! ItemStore implementation for the mysql backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use feedstore_core::{
    Item, ItemFilter, ItemInput, ItemPage, ItemStatusChange, StatusUpdate, tags_from_csv,
};
use sqlx::Row as _;
use sqlx::mysql::MySqlRow;

use super::{MysqlStorage, bind_all, id_list};
use crate::dialect::{Dialect, SqlParam};
use crate::error::StorageError;
use crate::query_builder::build_item_query;
use crate::traits::ItemStore;

const ITEM_COLUMNS: &str = "items.id, items.datetime, items.title, items.content, \
     items.unread, items.starred, items.source, items.thumbnail, items.icon, items.uid, \
     items.link, items.author, items.updatetime, items.lastseen";

fn row_to_item(row: &MySqlRow) -> Result<Item, StorageError> {
    Ok(Item {
        id: row.try_get("id")?,
        datetime: row.try_get("datetime")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        unread: row.try_get("unread")?,
        starred: row.try_get("starred")?,
        source: row.try_get("source")?,
        thumbnail: row.try_get("thumbnail")?,
        icon: row.try_get("icon")?,
        uid: row.try_get("uid")?,
        link: row.try_get("link")?,
        author: row.try_get("author")?,
        updatetime: row.try_get("updatetime")?,
        lastseen: row.try_get("lastseen")?,
        source_title: String::new(),
        tags: Vec::new(),
    })
}

impl MysqlStorage {
    /// Fill in the denormalized source title and tags without joining.
    async fn attach_source_info(&self, items: &mut [Item]) -> Result<(), StorageError> {
        if items.is_empty() {
            return Ok(());
        }
        let mut ids: Vec<i64> = items.iter().map(|i| i.source).collect();
        ids.sort_unstable();
        ids.dedup();

        let sql = format!("SELECT id, title, tags FROM sources WHERE id IN ({})", id_list(&ids));
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut info: HashMap<i64, (String, Vec<String>)> = HashMap::new();
        for row in &rows {
            let id: i64 = row.try_get("id")?;
            let title: String = row.try_get("title")?;
            let tags: String = row.try_get("tags")?;
            info.insert(id, (title, tags_from_csv(&tags)));
        }
        for item in items.iter_mut() {
            if let Some((title, tags)) = info.get(&item.source) {
                item.source_title.clone_from(title);
                item.tags.clone_from(tags);
            }
        }
        Ok(())
    }

    async fn fetch_items(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Item>, StorageError> {
        let rows = bind_all(sqlx::query(sql), params).fetch_all(&self.pool).await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(row_to_item(row)?);
        }
        self.attach_source_info(&mut items).await?;
        Ok(items)
    }
}

#[async_trait]
impl ItemStore for MysqlStorage {
    async fn list(&self, filter: &ItemFilter) -> Result<ItemPage, StorageError> {
        let q = build_item_query(filter, &self.config, Dialect::Mysql);
        let limit = if filter.limit == 0 {
            self.config.items_per_page
        } else {
            filter.limit.min(self.config.items_per_page_max)
        };

        let lookahead = format!(
            "SELECT items.id FROM items WHERE {} ORDER BY {} LIMIT 1 OFFSET {}",
            q.where_sql,
            q.order_sql,
            u64::from(filter.offset) + u64::from(limit),
        );
        let has_more =
            bind_all(sqlx::query(&lookahead), &q.params).fetch_optional(&self.pool).await?.is_some();

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            q.where_sql, q.order_sql, limit, filter.offset,
        );
        let entries = self.fetch_items(&sql, &q.params).await?;
        Ok(ItemPage { entries, has_more })
    }

    async fn get(&self, id: i64) -> Result<Option<Item>, StorageError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE items.id=?");
        let mut items = self.fetch_items(&sql, &[SqlParam::Int(id)]).await?;
        Ok(items.pop())
    }

    async fn insert(&self, input: &ItemInput) -> Result<i64, StorageError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO items
               (datetime, title, content, unread, starred, source, thumbnail, icon, uid, link,
                author, updatetime, lastseen)
             VALUES (?, ?, ?, TRUE, FALSE, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(input.datetime)
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.source)
        .bind(&input.thumbnail)
        .bind(&input.icon)
        .bind(&input.uid)
        .bind(&input.link)
        .bind(&input.author)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn find_existing(
        &self,
        uids: &[String],
        source: i64,
    ) -> Result<HashMap<String, i64>, StorageError> {
        if uids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = uids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("SELECT uid, id FROM items WHERE source=? AND uid IN ({placeholders})");
        let mut query = sqlx::query(&sql).bind(source);
        for uid in uids {
            query = query.bind(uid);
        }
        let rows = query.fetch_all(&self.pool).await?;
        let mut found = HashMap::with_capacity(rows.len());
        for row in &rows {
            found.insert(row.try_get::<String, _>("uid")?, row.try_get::<i64, _>("id")?);
        }
        Ok(found)
    }

    async fn update_lastseen(&self, ids: &[i64]) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }
        let sql = format!("UPDATE items SET lastseen=? WHERE id IN ({})", id_list(ids));
        sqlx::query(&sql).bind(Utc::now()).execute(&self.pool).await?;
        Ok(())
    }

    async fn set_unread(&self, ids: &[i64], unread: bool) -> Result<u64, StorageError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql =
            format!("UPDATE items SET unread=?, updatetime=? WHERE id IN ({})", id_list(ids));
        let result =
            sqlx::query(&sql).bind(unread).bind(Utc::now()).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn set_starred(&self, id: i64, starred: bool) -> Result<u64, StorageError> {
        let result = sqlx::query("UPDATE items SET starred=?, updatetime=? WHERE id=?")
            .bind(starred)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn apply_status_updates(
        &self,
        updates: &[StatusUpdate],
    ) -> Result<Vec<bool>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let mut applied = Vec::with_capacity(updates.len());
        for update in updates {
            if update.unread.is_none() && update.starred.is_none() {
                applied.push(false);
                continue;
            }
            let mut sets = Vec::new();
            let mut params = Vec::new();
            if let Some(unread) = update.unread {
                sets.push("unread=?");
                params.push(SqlParam::Bool(unread));
            }
            if let Some(starred) = update.starred {
                sets.push("starred=?");
                params.push(SqlParam::Bool(starred));
            }
            sets.push("updatetime=?");
            params.push(SqlParam::Timestamp(update.datetime));
            params.push(SqlParam::Int(update.id));
            params.push(SqlParam::Timestamp(update.datetime));

            let sql =
                format!("UPDATE items SET {} WHERE id=? AND updatetime<=?", sets.join(", "));
            let result = bind_all(sqlx::query(&sql), &params).execute(&mut *tx).await?;
            applied.push(result.rows_affected() > 0);
        }
        tx.commit().await?;
        Ok(applied)
    }

    async fn items_since_id(
        &self,
        since_id: i64,
        not_before: Option<DateTime<Utc>>,
        how_many: u32,
    ) -> Result<Vec<Item>, StorageError> {
        let mut params = vec![SqlParam::Int(since_id)];
        let mut cutoff = String::new();
        if let Some(not_before) = not_before {
            cutoff = " AND (items.datetime>=? OR items.lastseen>=?)".to_owned();
            params.push(SqlParam::Timestamp(not_before));
            params.push(SqlParam::Timestamp(not_before));
        }
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE items.id>?{cutoff} \
             ORDER BY items.id ASC LIMIT {how_many}"
        );
        self.fetch_items(&sql, &params).await
    }

    async fn statuses_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ItemStatusChange>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, unread, starred FROM items WHERE updatetime>? ORDER BY id ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        let mut changes = Vec::with_capacity(rows.len());
        for row in &rows {
            changes.push(ItemStatusChange {
                id: row.try_get("id")?,
                unread: row.try_get("unread")?,
                starred: row.try_get("starred")?,
            });
        }
        Ok(changes)
    }

    async fn last_update(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let max: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(updatetime) FROM items").fetch_one(&self.pool).await?;
        Ok(max)
    }

    async fn last_id(&self) -> Result<i64, StorageError> {
        let max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(id) FROM items").fetch_one(&self.pool).await?;
        Ok(max.unwrap_or(0))
    }

    async fn cleanup(&self, days: u32) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await?;
        let mut deleted =
            sqlx::query("DELETE FROM items WHERE source NOT IN (SELECT id FROM sources)")
                .execute(&mut *tx)
                .await?
                .rows_affected();
        if days > 0 {
            let horizon = Utc::now() - Duration::days(i64::from(days));
            let sql = format!(
                "DELETE FROM items WHERE {} AND datetime<?",
                Dialect::Mysql.is_false("starred")
            );
            deleted += sqlx::query(&sql)
                .bind(horizon)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;
        Ok(deleted)
    }
}
