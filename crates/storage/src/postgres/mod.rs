//! PostgreSQL backend using sqlx.

mod items;
mod migrations;
mod sources;
mod stats;
mod tags;

use async_trait::async_trait;
use feedstore_core::StoreConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::dialect::SqlParam;
use crate::error::StorageError;
use crate::traits::SchemaStore;

const POOL_MAX_CONNECTIONS: u32 = 8;
const POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL-backed storage over a sqlx pool.
#[derive(Clone, Debug)]
pub struct PgStorage {
    pub(crate) pool: PgPool,
    pub(crate) config: StoreConfig,
}

impl PgStorage {
    /// Connect and bring the schema up to date. A failed migration aborts
    /// startup.
    pub async fn new(database_url: &str, config: StoreConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(POOL_MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(POOL_ACQUIRE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        migrations::run(&pool).await?;
        tracing::info!("postgres storage initialized");
        Ok(Self { pool, config })
    }
}

#[async_trait]
impl SchemaStore for PgStorage {
    async fn schema_version(&self) -> Result<i32, StorageError> {
        migrations::read_version(&self.pool).await
    }
}

/// Bind engine-agnostic parameters in order.
pub(crate) fn bind_all<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    params: &[SqlParam],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
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
