//! ItemStore implementation for the sqlite backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use feedstore_core::{
    Item, ItemFilter, ItemInput, ItemPage, ItemStatusChange, StatusUpdate, tags_from_csv,
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};

use super::{SqliteStorage, get_conn, id_list, log_row_error, sql_value, ts_from_row, ts_from_sql, ts_to_sql};
use crate::dialect::Dialect;
use crate::error::StorageError;
use crate::query_builder::build_item_query;
use crate::traits::ItemStore;

pub(crate) const ITEM_COLUMNS: &str = "items.id, items.datetime, items.title, items.content, \
     items.unread, items.starred, items.source, items.thumbnail, items.icon, items.uid, \
     items.link, items.author, items.updatetime, items.lastseen";

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        datetime: ts_from_row(1, &row.get::<_, String>(1)?)?,
        title: row.get(2)?,
        content: row.get(3)?,
        unread: row.get(4)?,
        starred: row.get(5)?,
        source: row.get(6)?,
        thumbnail: row.get(7)?,
        icon: row.get(8)?,
        uid: row.get(9)?,
        link: row.get(10)?,
        author: row.get(11)?,
        updatetime: ts_from_row(12, &row.get::<_, String>(12)?)?,
        lastseen: ts_from_row(13, &row.get::<_, String>(13)?)?,
        source_title: String::new(),
        tags: Vec::new(),
    })
}

/// Fill in the denormalized source title and tags without joining.
///
/// A join multiplies row width on what can be a large items scan; one
/// bounded lookup over the handful of distinct sources is cheaper.
fn attach_source_info(conn: &Connection, items: &mut [Item]) -> Result<(), StorageError> {
    if items.is_empty() {
        return Ok(());
    }
    let mut ids: Vec<i64> = items.iter().map(|i| i.source).collect();
    ids.sort_unstable();
    ids.dedup();

    let sql = format!("SELECT id, title, tags FROM sources WHERE id IN ({})", id_list(&ids));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
    })?;
    let mut info: HashMap<i64, (String, Vec<String>)> = HashMap::new();
    for row in rows.filter_map(log_row_error) {
        info.insert(row.0, (row.1, tags_from_csv(&row.2)));
    }
    for item in items.iter_mut() {
        if let Some((title, tags)) = info.get(&item.source) {
            item.source_title.clone_from(title);
            item.tags.clone_from(tags);
        }
    }
    Ok(())
}

fn fetch_items(
    conn: &Connection,
    sql: &str,
    params: &[rusqlite::types::Value],
) -> Result<Vec<Item>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let mut items: Vec<Item> = stmt
        .query_map(params_from_iter(params.iter().cloned()), row_to_item)?
        .filter_map(log_row_error)
        .collect();
    attach_source_info(conn, &mut items)?;
    Ok(items)
}

impl SqliteStorage {
    fn list_sync(&self, filter: &ItemFilter) -> Result<ItemPage, StorageError> {
        let conn = get_conn(&self.pool)?;
        let q = build_item_query(filter, &self.config, Dialect::Sqlite);
        let params: Vec<rusqlite::types::Value> = q.params.iter().map(sql_value).collect();

        let limit = if filter.limit == 0 {
            self.config.items_per_page
        } else {
            filter.limit.min(self.config.items_per_page_max)
        };

        // Bounded lookahead: one row past the requested window decides
        // has_more without counting the full result set.
        let lookahead = format!(
            "SELECT items.id FROM items WHERE {} ORDER BY {} LIMIT 1 OFFSET {}",
            q.where_sql,
            q.order_sql,
            u64::from(filter.offset) + u64::from(limit),
        );
        let has_more = conn
            .query_row(&lookahead, params_from_iter(params.iter().cloned()), |row| {
                row.get::<_, i64>(0)
            })
            .optional()?
            .is_some();

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            q.where_sql, q.order_sql, limit, filter.offset,
        );
        let entries = fetch_items(&conn, &sql, &params)?;
        Ok(ItemPage { entries, has_more })
    }
}

/// UPDATE statement plus bind values for one status update, or `None`
/// when the update carries no state change at all.
fn status_update_stmt(update: &StatusUpdate) -> Option<(String, Vec<rusqlite::types::Value>)> {
    if update.unread.is_none() && update.starred.is_none() {
        return None;
    }
    let mut sets = Vec::new();
    let mut values: Vec<rusqlite::types::Value> = Vec::new();
    if let Some(unread) = update.unread {
        sets.push("unread=?");
        values.push(rusqlite::types::Value::Integer(i64::from(unread)));
    }
    if let Some(starred) = update.starred {
        sets.push("starred=?");
        values.push(rusqlite::types::Value::Integer(i64::from(starred)));
    }
    // updatetime advances to the incoming time; the guard below makes
    // sure it never moves backward.
    sets.push("updatetime=?");
    values.push(rusqlite::types::Value::Text(ts_to_sql(update.datetime)));
    values.push(rusqlite::types::Value::Integer(update.id));
    values.push(rusqlite::types::Value::Text(ts_to_sql(update.datetime)));

    let sql = format!("UPDATE items SET {} WHERE id=? AND updatetime<=?", sets.join(", "));
    Some((sql, values))
}

#[async_trait]
impl ItemStore for SqliteStorage {
    async fn list(&self, filter: &ItemFilter) -> Result<ItemPage, StorageError> {
        self.list_sync(filter)
    }

    async fn get(&self, id: i64) -> Result<Option<Item>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE items.id=?1");
        let mut items = fetch_items(&conn, &sql, &[rusqlite::types::Value::Integer(id)])?;
        Ok(items.pop())
    }

    async fn insert(&self, input: &ItemInput) -> Result<i64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let now = ts_to_sql(Utc::now());
        conn.execute(
            "INSERT INTO items
               (datetime, title, content, unread, starred, source, thumbnail, icon, uid, link,
                author, updatetime, lastseen)
             VALUES (?1, ?2, ?3, 1, 0, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                ts_to_sql(input.datetime),
                input.title,
                input.content,
                input.source,
                input.thumbnail,
                input.icon,
                input.uid,
                input.link,
                input.author,
                now,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn find_existing(
        &self,
        uids: &[String],
        source: i64,
    ) -> Result<HashMap<String, i64>, StorageError> {
        if uids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = get_conn(&self.pool)?;
        let placeholders = uids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql =
            format!("SELECT uid, id FROM items WHERE source=? AND uid IN ({placeholders})");
        let mut values: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Integer(source)];
        values.extend(uids.iter().map(|u| rusqlite::types::Value::Text(u.clone())));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        Ok(rows.filter_map(log_row_error).collect())
    }

    async fn update_lastseen(&self, ids: &[i64]) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }
        let conn = get_conn(&self.pool)?;
        let sql = format!("UPDATE items SET lastseen=?1 WHERE id IN ({})", id_list(ids));
        conn.execute(&sql, params![ts_to_sql(Utc::now())])?;
        Ok(())
    }

    async fn set_unread(&self, ids: &[i64], unread: bool) -> Result<u64, StorageError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "UPDATE items SET unread=?1, updatetime=?2 WHERE id IN ({})",
            id_list(ids)
        );
        let affected = conn.execute(&sql, params![unread, ts_to_sql(Utc::now())])?;
        Ok(affected as u64)
    }

    async fn set_starred(&self, id: i64, starred: bool) -> Result<u64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let affected = conn.execute(
            "UPDATE items SET starred=?1, updatetime=?2 WHERE id=?3",
            params![starred, ts_to_sql(Utc::now()), id],
        )?;
        Ok(affected as u64)
    }

    async fn apply_status_updates(
        &self,
        updates: &[StatusUpdate],
    ) -> Result<Vec<bool>, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction()?;
        let mut applied = Vec::with_capacity(updates.len());
        for update in updates {
            match status_update_stmt(update) {
                Some((sql, values)) => {
                    let affected = tx.execute(&sql, params_from_iter(values))?;
                    applied.push(affected > 0);
                },
                None => applied.push(false),
            }
        }
        tx.commit()?;
        Ok(applied)
    }

    async fn items_since_id(
        &self,
        since_id: i64,
        not_before: Option<DateTime<Utc>>,
        how_many: u32,
    ) -> Result<Vec<Item>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut values: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Integer(since_id)];
        let mut cutoff = String::new();
        if let Some(not_before) = not_before {
            cutoff = " AND (items.datetime>=?2 OR items.lastseen>=?3)".to_owned();
            let ts = rusqlite::types::Value::Text(ts_to_sql(not_before));
            values.push(ts.clone());
            values.push(ts);
        }
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE items.id>?1{cutoff} \
             ORDER BY items.id ASC LIMIT {how_many}"
        );
        fetch_items(&conn, &sql, &values)
    }

    async fn statuses_changed_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ItemStatusChange>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT id, unread, starred FROM items WHERE updatetime>?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![ts_to_sql(since)], |row| {
            Ok(ItemStatusChange { id: row.get(0)?, unread: row.get(1)?, starred: row.get(2)? })
        })?;
        Ok(rows.filter_map(log_row_error).collect())
    }

    async fn last_update(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let max: Option<String> =
            conn.query_row("SELECT MAX(updatetime) FROM items", [], |row| row.get(0))?;
        max.map(|s| ts_from_sql(&s)).transpose()
    }

    async fn last_id(&self) -> Result<i64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let max: i64 =
            conn.query_row("SELECT COALESCE(MAX(id), 0) FROM items", [], |row| row.get(0))?;
        Ok(max)
    }

    async fn cleanup(&self, days: u32) -> Result<u64, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction()?;
        let mut deleted =
            tx.execute("DELETE FROM items WHERE source NOT IN (SELECT id FROM sources)", [])?;
        if days > 0 {
            let horizon = Utc::now() - Duration::days(i64::from(days));
            let sql = format!(
                "DELETE FROM items WHERE {} AND datetime<?1",
                Dialect::Sqlite.is_false("starred")
            );
            deleted += tx.execute(&sql, params![ts_to_sql(horizon)])?;
        }
        tx.commit()?;
        Ok(deleted as u64)
    }
}
