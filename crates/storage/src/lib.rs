//! Persistence core for feedstore
//!
//! One store trait surface (`ItemStore`, `SourceStore`, `TagStore`,
//! `StatsStore`) over three interchangeable relational engines, selected
//! at startup by cargo feature and configuration:
//!
//! - `sqlite` (default): embedded file database via rusqlite + r2d2
//! - `postgres`: client/server engine via sqlx
//! - `mysql`: client/server engine via sqlx
//!
//! Shared query building lives in [`query_builder`] and depends only on
//! the per-engine SQL fragments in [`dialect`]; nothing outside the
//! backend modules names a concrete engine.

mod aggregate;
mod backend;
mod dialect;
mod error;
mod query_builder;
mod traits;

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(test)]
mod tests;

pub use backend::StorageBackend;
pub use dialect::Dialect;
pub use error::StorageError;
pub use traits::{ItemStore, SchemaStore, SourceStore, StatsStore, TagStore};

#[cfg(feature = "mysql")]
pub use mysql::MysqlStorage;
#[cfg(feature = "postgres")]
pub use postgres::PgStorage;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
