//! Schema migrations for the postgres backend.
//!
//! Same state machine as the other engines: fresh stores get the full
//! current schema directly; existing stores apply pending versions in
//! ascending order, one transaction each, with existence-guarded DDL.

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::StorageError;

pub(crate) const CURRENT_SCHEMA_VERSION: i32 = 5;

pub(crate) async fn run(pool: &PgPool) -> Result<(), StorageError> {
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

pub(crate) async fn read_version(pool: &PgPool) -> Result<i32, StorageError> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT MAX(version) FROM version").fetch_one(pool).await?;
    Ok(version.unwrap_or(0))
}

async fn table_exists(pool: &PgPool, table: &str) -> Result<bool, StorageError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
         WHERE table_schema=current_schema() AND table_name=$1)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

async fn add_column_if_not_exists(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    column: &str,
    col_type: &str,
) -> Result<(), sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.columns \
         WHERE table_schema=current_schema() AND table_name=$1 AND column_name=$2)",
    )
    .bind(table)
    .bind(column)
    .fetch_one(&mut **tx)
    .await?;
    if !exists {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {col_type}");
        sqlx::query(&sql).execute(&mut **tx).await?;
    }
    Ok(())
}

async fn create_current_schema(pool: &PgPool) -> Result<(), StorageError> {
    let err = |e: sqlx::Error| StorageError::Migration(format!("initial schema failed: {e}"));
    let mut tx = pool.begin().await.map_err(err)?;
    let ddl = [
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id          BIGSERIAL PRIMARY KEY,
            datetime    TIMESTAMPTZ NOT NULL,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            thumbnail   TEXT,
            icon        TEXT,
            unread      BOOLEAN NOT NULL DEFAULT TRUE,
            starred     BOOLEAN NOT NULL DEFAULT FALSE,
            source      BIGINT NOT NULL,
            uid         TEXT NOT NULL,
            link        TEXT NOT NULL,
            author      TEXT,
            updatetime  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            lastseen    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        "CREATE INDEX IF NOT EXISTS items_source ON items (source)",
        "CREATE UNIQUE INDEX IF NOT EXISTS items_source_uid ON items (source, uid)",
        "CREATE INDEX IF NOT EXISTS items_updatetime ON items (updatetime)",
        "CREATE INDEX IF NOT EXISTS items_lastseen ON items (lastseen)",
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            id          BIGSERIAL PRIMARY KEY,
            title       TEXT NOT NULL,
            tags        TEXT NOT NULL DEFAULT '',
            filter      TEXT,
            spout       TEXT NOT NULL,
            params      TEXT NOT NULL,
            error       TEXT,
            lastupdate  TIMESTAMPTZ,
            lastentry   TIMESTAMPTZ
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            tag         TEXT NOT NULL UNIQUE,
            color       TEXT NOT NULL
        )
        "#,
        "CREATE TABLE IF NOT EXISTS version (version INTEGER NOT NULL)",
    ];
    for stmt in ddl {
        sqlx::query(stmt).execute(&mut *tx).await.map_err(err)?;
    }
    sqlx::query("INSERT INTO version (version) VALUES ($1)")
        .bind(CURRENT_SCHEMA_VERSION)
        .execute(&mut *tx)
        .await
        .map_err(err)?;
    tx.commit().await.map_err(err)
}

async fn apply_migration(pool: &PgPool, version: i32) -> Result<(), sqlx::Error> {
    tracing::info!(version, "running migration");
    let mut tx = pool.begin().await?;
    match version {
        2 => {
            add_column_if_not_exists(&mut tx, "items", "updatetime", "TIMESTAMPTZ").await?;
            sqlx::query("UPDATE items SET updatetime=datetime WHERE updatetime IS NULL")
                .execute(&mut *tx)
                .await?;
        },
        3 => {
            add_column_if_not_exists(&mut tx, "items", "lastseen", "TIMESTAMPTZ").await?;
            sqlx::query("UPDATE items SET lastseen=datetime WHERE lastseen IS NULL")
                .execute(&mut *tx)
                .await?;
        },
        4 => {
            add_column_if_not_exists(&mut tx, "sources", "filter", "TEXT").await?;
            add_column_if_not_exists(&mut tx, "sources", "lastentry", "TIMESTAMPTZ").await?;
        },
        5 => {
            for stmt in [
                "CREATE UNIQUE INDEX IF NOT EXISTS items_source_uid ON items (source, uid)",
                "CREATE INDEX IF NOT EXISTS items_updatetime ON items (updatetime)",
                "CREATE INDEX IF NOT EXISTS items_lastseen ON items (lastseen)",
            ] {
                sqlx::query(stmt).execute(&mut *tx).await?;
            }
        },
        _ => return Err(sqlx::Error::Protocol(format!("unknown migration version {version}"))),
    }
    sqlx::query("INSERT INTO version (version) VALUES ($1)")
        .bind(version)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
