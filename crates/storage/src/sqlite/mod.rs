//! Embedded file-based backend on rusqlite + r2d2.
//!
//! All methods are synchronous internally; the async store traits wrap
//! them directly. Booleans are stored as 0/1 integers and timestamps as
//! fixed-width RFC 3339 text, so lexicographic comparison in SQL matches
//! chronological order.

mod items;
mod migrations;
mod sources;
mod stats;
mod tags;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use feedstore_core::{StoreConfig, env_parse_with_default};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use rusqlite::types::Value;

use crate::dialect::SqlParam;
use crate::error::StorageError;
use crate::traits::SchemaStore;

pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// SQLite-backed storage over a connection pool.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pub(crate) pool: Pool<SqliteConnectionManager>,
    pub(crate) config: StoreConfig,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring its schema up to date.
    /// A failed migration aborts startup.
    pub fn new(db_path: &Path, config: StoreConfig) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);
        let pool = Pool::builder()
            .max_size(db_pool_size())
            .build(manager)
            .map_err(|e| StorageError::Pool(e.to_string()))?;
        let mut conn = get_conn(&pool)?;
        migrations::run(&mut conn)?;
        Ok(Self { pool, config })
    }
}

#[async_trait]
impl SchemaStore for SqliteStorage {
    async fn schema_version(&self) -> Result<i32, StorageError> {
        let conn = get_conn(&self.pool)?;
        migrations::read_version(&conn)
    }
}

fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 30000;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )
}

fn db_pool_size() -> u32 {
    env_parse_with_default("FEEDSTORE_DB_POOL_SIZE", 8)
}

/// Get a connection from the pool.
pub(crate) fn get_conn(pool: &Pool<SqliteConnectionManager>) -> Result<PooledConn, StorageError> {
    pool.get().map_err(|e| StorageError::Pool(e.to_string()))
}

/// Fixed-width UTC text representation; sorts lexicographically in SQL.
pub(crate) fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp inside a rusqlite row closure.
pub(crate) fn ts_from_row(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a stored timestamp outside row mapping.
pub(crate) fn ts_from_sql(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::corrupt(format!("timestamp column: {s}"), e))
}

/// Coerce an engine-agnostic parameter to a sqlite value.
pub(crate) fn sql_value(p: &SqlParam) -> Value {
    match p {
        SqlParam::Text(s) => Value::Text(s.clone()),
        SqlParam::Int(i) => Value::Integer(*i),
        SqlParam::Bool(b) => Value::Integer(i64::from(*b)),
        SqlParam::Timestamp(t) => Value::Text(ts_to_sql(*t)),
    }
}

/// Log row read errors and filter them out.
pub(crate) fn log_row_error<T>(result: rusqlite::Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("row read error: {}", e);
            None
        },
    }
}

/// Inline a validated id list for an `IN (...)` clause.
pub(crate) fn id_list(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
}
