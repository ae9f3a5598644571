//! MySQL backend using sqlx.

mod items;
mod migrations;
mod sources;
mod stats;
mod tags;

use async_trait::async_trait;
use feedstore_core::StoreConfig;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::dialect::SqlParam;
use crate::error::StorageError;
use crate::traits::SchemaStore;

const POOL_MAX_CONNECTIONS: u32 = 8;
const POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// MySQL-backed storage over a sqlx pool.
#[derive(Clone, Debug)]
pub struct MysqlStorage {
    pub(crate) pool: MySqlPool,
    pub(crate) config: StoreConfig,
}

impl MysqlStorage {
    /// Connect and bring the schema up to date. A failed migration aborts
    /// startup.
    pub async fn new(database_url: &str, config: StoreConfig) -> Result<Self, StorageError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(POOL_MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(POOL_ACQUIRE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        migrations::run(&pool).await?;
        tracing::info!("mysql storage initialized");
        Ok(Self { pool, config })
    }
}

#[async_trait]
impl SchemaStore for MysqlStorage {
    async fn schema_version(&self) -> Result<i32, StorageError> {
        migrations::read_version(&self.pool).await
    }
}

/// Bind engine-agnostic parameters in order.
pub(crate) fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments>,
    params: &[SqlParam],
) -> sqlx::query::Query<'q, sqlx::MySql, sqlx::mysql::MySqlArguments> {
    for p in params {
        query = match p {
            SqlParam::Text(s) => query.bind(s.clone()),
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Bool(b) => query.bind(*b),
            SqlParam::Timestamp(t) => query.bind(*t),
        };
    }
    query
}

/// Comma-joined integer id list, safe to inline.
pub(crate) fn id_list(ids: &[i64]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}
