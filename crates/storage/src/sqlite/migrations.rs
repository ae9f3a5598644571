//! Schema migrations for the sqlite backend.
//!
//! Versions are applied strictly in ascending order, each inside one
//! transaction. A fresh store (no `version` table) gets the full current
//! schema directly and records the final version; the historical chain is
//! never replayed on a new install. Column additions are guarded by
//! existence checks so re-running after a crash between DDL and version
//! record is harmless.

use rusqlite::Connection;

use crate::error::StorageError;

pub(crate) const CURRENT_SCHEMA_VERSION: i32 = 5;

pub(crate) fn run(conn: &mut Connection) -> Result<(), StorageError> {
    if !table_exists(conn, "version")? {
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "fresh store, creating full schema");
        return create_current_schema(conn);
    }

    let mut version = read_version(conn)?;
    tracing::info!(current = version, target = CURRENT_SCHEMA_VERSION, "database schema version");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        apply_migration(conn, next)?;
        version = next;
    }
    Ok(())
}

pub(crate) fn read_version(conn: &Connection) -> Result<i32, StorageError> {
    let version =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM version", [], |row| row.get(0))?;
    Ok(version)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool, StorageError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub(crate) fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let sql = format!("PRAGMA table_info({table})");
    let mut stmt = match conn.prepare(&sql) {
        Ok(s) => s,
        Err(_) => return false,
    };
    let rows = match stmt.query_map([], |row| row.get::<_, String>(1)) {
        Ok(r) => r,
        Err(_) => return false,
    };
    rows.flatten().any(|name| name == column)
}

fn add_column_if_not_exists(
    conn: &Connection,
    table: &str,
    column: &str,
    col_type: &str,
) -> Result<(), rusqlite::Error> {
    if !column_exists(conn, table, column) {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {col_type}");
        conn.execute(&sql, [])?;
    }
    Ok(())
}

fn create_current_schema(conn: &mut Connection) -> Result<(), StorageError> {
    let err =
        |e: rusqlite::Error| StorageError::Migration(format!("initial schema failed: {e}"));
    let tx = conn.transaction().map_err(err)?;
    tx.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            datetime    TEXT NOT NULL,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            thumbnail   TEXT,
            icon        TEXT,
            unread      INTEGER NOT NULL DEFAULT 1,
            starred     INTEGER NOT NULL DEFAULT 0,
            source      INTEGER NOT NULL,
            uid         TEXT NOT NULL,
            link        TEXT NOT NULL,
            author      TEXT,
            updatetime  TEXT NOT NULL,
            lastseen    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS items_source ON items (source);
        CREATE UNIQUE INDEX IF NOT EXISTS items_source_uid ON items (source, uid);
        CREATE INDEX IF NOT EXISTS items_updatetime ON items (updatetime);
        CREATE INDEX IF NOT EXISTS items_lastseen ON items (lastseen);

        CREATE TABLE IF NOT EXISTS sources (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            title       TEXT NOT NULL,
            tags        TEXT NOT NULL DEFAULT '',
            filter      TEXT,
            spout       TEXT NOT NULL,
            params      TEXT NOT NULL,
            error       TEXT,
            lastupdate  TEXT,
            lastentry   TEXT
        );

        CREATE TABLE IF NOT EXISTS tags (
            tag         TEXT NOT NULL UNIQUE,
            color       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS version (
            version     INTEGER NOT NULL
        );
        "#,
    )
    .map_err(err)?;
    tx.execute("INSERT INTO version (version) VALUES (?1)", [CURRENT_SCHEMA_VERSION])
        .map_err(err)?;
    tx.commit().map_err(err)
}

fn apply_migration(conn: &mut Connection, version: i32) -> Result<(), StorageError> {
    tracing::info!(version, "running migration");
    let tx = conn.transaction().map_err(migration_err(version))?;
    let steps = |tx: &rusqlite::Transaction<'_>| match version {
        2 => {
            // updatetime drives delta sync; backfill from publication time.
            add_column_if_not_exists(tx, "items", "updatetime", "TEXT")?;
            tx.execute("UPDATE items SET updatetime=datetime WHERE updatetime IS NULL", [])?;
            Ok(())
        },
        3 => {
            add_column_if_not_exists(tx, "items", "lastseen", "TEXT")?;
            tx.execute("UPDATE items SET lastseen=datetime WHERE lastseen IS NULL", [])?;
            Ok(())
        },
        4 => {
            add_column_if_not_exists(tx, "sources", "filter", "TEXT")?;
            add_column_if_not_exists(tx, "sources", "lastentry", "TEXT")?;
            Ok(())
        },
        5 => tx.execute_batch(
            "CREATE UNIQUE INDEX IF NOT EXISTS items_source_uid ON items (source, uid);
             CREATE INDEX IF NOT EXISTS items_updatetime ON items (updatetime);
             CREATE INDEX IF NOT EXISTS items_lastseen ON items (lastseen);",
        ),
        _ => Err(rusqlite::Error::InvalidQuery),
    };
    steps(&tx).map_err(migration_err(version))?;
    tx.execute("INSERT INTO version (version) VALUES (?1)", [version])
        .map_err(migration_err(version))?;
    tx.commit().map_err(migration_err(version))
}

fn migration_err(version: i32) -> impl Fn(rusqlite::Error) -> StorageError {
    move |e| StorageError::Migration(format!("migration v{version} failed: {e}"))
}
