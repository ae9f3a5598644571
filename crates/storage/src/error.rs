//! Typed error enum for the storage layer.
//!
//! Every engine-level failure surfaces as one `StorageError`; no backend
//! may silently swallow a write failure.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row not found for expected-present entity.
    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Unique constraint violation (duplicate uid within a source, tag name).
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// SQL / connection / timeout failure from a sqlx engine.
    #[cfg(any(feature = "postgres", feature = "mysql"))]
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    /// SQL / connection failure from the embedded engine.
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    /// Connection pool exhaustion or setup failure.
    #[error("connection pool: {0}")]
    Pool(String),

    /// Row data could not be coerced into its canonical domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Migration failure. Fatal at startup; the process must not serve
    /// with a partially migrated schema.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Whether this error is likely transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(any(feature = "postgres", feature = "mysql"))]
            Self::Database(e) => matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)),
            Self::Pool(_) => true,
            _ => false,
        }
    }

    /// Whether this error is a unique-constraint violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    pub(crate) fn corrupt(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::DataCorruption { context: context.into(), source: Box::new(source) }
    }
}

/// Custom `From<sqlx::Error>` rather than a blanket `#[from]` so that
/// SQLSTATE 23505 (postgres) and 23000 (mysql) map to `Duplicate`;
/// everything else is `Database`.
#[cfg(any(feature = "postgres", feature = "mysql"))]
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if db_err.code().is_some_and(|c| c == "23505" || c == "23000") =>
            {
                Self::Duplicate(db_err.message().to_owned())
            },
            _ => Self::Database(err),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Duplicate(msg.clone().unwrap_or_else(|| e.to_string()))
            },
            _ => Self::Sqlite(err),
        }
    }
}
