//! Schema migrations for the mysql backend.
//!
//! Same state machine as the other engines, but MySQL commits implicitly
//! around DDL, so a transaction cannot make a migration atomic. Every DDL
//! statement is existence-guarded instead; an interrupted migration is
//! finished by simply running it again.

use sqlx::MySqlPool;

use crate::error::StorageError;

pub(crate) const CURRENT_SCHEMA_VERSION: i32 = 5;

pub(crate) async fn run(pool: &MySqlPool) -> Result<(), StorageError> {
    if !table_exists(pool, "version").await? {
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "fresh store, creating full schema");
        return create_current_schema(pool).await;
    }

    let mut version = read_version(pool).await?;
    tracing::info!(current = version, target = CURRENT_SCHEMA_VERSION, "database schema version");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        apply_migration(pool, next)
            .await
            .map_err(|e| StorageError::Migration(format!("migration v{next} failed: {e}")))?;
        version = next;
    }
    Ok(())
}

pub(crate) async fn read_version(pool: &MySqlPool) -> Result<i32, StorageError> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT MAX(version) FROM version").fetch_one(pool).await?;
    Ok(version.unwrap_or(0))
}

async fn table_exists(pool: &MySqlPool, table: &str) -> Result<bool, StorageError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema=DATABASE() AND table_name=?",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

async fn add_column_if_not_exists(
    pool: &MySqlPool,
    table: &str,
    column: &str,
    col_type: &str,
) -> Result<(), sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.columns \
         WHERE table_schema=DATABASE() AND table_name=? AND column_name=?",
    )
    .bind(table)
    .bind(column)
    .fetch_one(pool)
    .await?;
    if count == 0 {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {col_type}");
        sqlx::query(&sql).execute(pool).await?;
    }
    Ok(())
}

/// MySQL has no `CREATE INDEX IF NOT EXISTS`.
async fn create_index_if_not_exists(
    pool: &MySqlPool,
    table: &str,
    index: &str,
    unique: bool,
    columns: &str,
) -> Result<(), sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.statistics \
         WHERE table_schema=DATABASE() AND table_name=? AND index_name=?",
    )
    .bind(table)
    .bind(index)
    .fetch_one(pool)
    .await?;
    if count == 0 {
        let unique = if unique { "UNIQUE " } else { "" };
        let sql = format!("CREATE {unique}INDEX {index} ON {table} ({columns})");
        sqlx::query(&sql).execute(pool).await?;
    }
    Ok(())
}

async fn create_indexes(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    create_index_if_not_exists(pool, "items", "items_source", false, "source").await?;
    create_index_if_not_exists(pool, "items", "items_source_uid", true, "source, uid").await?;
    create_index_if_not_exists(pool, "items", "items_updatetime", false, "updatetime").await?;
    create_index_if_not_exists(pool, "items", "items_lastseen", false, "lastseen").await
}

async fn create_current_schema(pool: &MySqlPool) -> Result<(), StorageError> {
    let err = |e: sqlx::Error| StorageError::Migration(format!("initial schema failed: {e}"));
    let ddl = [
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id          BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
            datetime    DATETIME(6) NOT NULL,
            title       TEXT NOT NULL,
            content     LONGTEXT NOT NULL,
            thumbnail   TEXT,
            icon        TEXT,
            unread      BOOLEAN NOT NULL DEFAULT TRUE,
            starred     BOOLEAN NOT NULL DEFAULT FALSE,
            source      BIGINT NOT NULL,
            uid         VARCHAR(255) NOT NULL,
            link        TEXT NOT NULL,
            author      VARCHAR(255),
            updatetime  DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6),
            lastseen    DATETIME(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            id          BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
            title       TEXT NOT NULL,
            tags        TEXT NOT NULL,
            filter      TEXT,
            spout       TEXT NOT NULL,
            params      TEXT NOT NULL,
            error       TEXT,
            lastupdate  DATETIME(6),
            lastentry   DATETIME(6)
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            tag         VARCHAR(255) NOT NULL UNIQUE,
            color       VARCHAR(7) NOT NULL
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
        "#,
        "CREATE TABLE IF NOT EXISTS version (version INT NOT NULL)",
    ];
    for stmt in ddl {
        sqlx::query(stmt).execute(pool).await.map_err(err)?;
    }
    create_indexes(pool).await.map_err(err)?;
    sqlx::query("INSERT INTO version (version) VALUES (?)")
        .bind(CURRENT_SCHEMA_VERSION)
        .execute(pool)
        .await
        .map_err(err)?;
    Ok(())
}

async fn apply_migration(pool: &MySqlPool, version: i32) -> Result<(), sqlx::Error> {
    tracing::info!(version, "running migration");
    match version {
        2 => {
            add_column_if_not_exists(pool, "items", "updatetime", "DATETIME(6)").await?;
            sqlx::query("UPDATE items SET updatetime=datetime WHERE updatetime IS NULL")
                .execute(pool)
                .await?;
        },
        3 => {
            add_column_if_not_exists(pool, "items", "lastseen", "DATETIME(6)").await?;
            sqlx::query("UPDATE items SET lastseen=datetime WHERE lastseen IS NULL")
                .execute(pool)
                .await?;
        },
        4 => {
            add_column_if_not_exists(pool, "sources", "filter", "TEXT").await?;
            add_column_if_not_exists(pool, "sources", "lastentry", "DATETIME(6)").await?;
        },
        5 => create_indexes(pool).await?,
        _ => return Err(sqlx::Error::Protocol(format!("unknown migration version {version}"))),
    }
    sqlx::query("INSERT INTO version (version) VALUES (?)").bind(version).execute(pool).await?;
    Ok(())
}
