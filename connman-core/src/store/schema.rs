//! Database schema and migrations.
//!
//! Each entry of [`MIGRATIONS`] moves the schema one version forward. The
//! applied version is tracked in `PRAGMA user_version`.

use rusqlite::Connection;
use tracing::debug;

use crate::error::StoreResult;

const MIGRATIONS: &[&str] = &[
    // v1: connection table; AUTOINCREMENT keeps deleted ids from coming back
    "
    CREATE TABLE IF NOT EXISTS connections (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        alias         TEXT NOT NULL UNIQUE,
        protocol      TEXT NOT NULL,
        host          TEXT NOT NULL,
        port          INTEGER,
        username      TEXT,
        password      BLOB,
        ssh_key_path  TEXT,
        domain        TEXT,
        resolution    TEXT,
        tags          TEXT NOT NULL DEFAULT '[]',
        notes         TEXT,
        extras        TEXT NOT NULL DEFAULT '{}',
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL
    );
    ",
    // v2
    "
    CREATE INDEX IF NOT EXISTS idx_connections_protocol ON connections(protocol);
    ",
];

/// Returns the schema version this build writes
pub const fn current_version() -> i64 {
    MIGRATIONS.len() as i64
}

/// Applies every migration newer than the database's `user_version`
pub fn migrate(conn: &mut Connection) -> StoreResult<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version >= current_version() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(version as usize) {
        tx.execute_batch(sql)?;
        debug!(version = index + 1, "Applied schema migration");
    }
    tx.pragma_update(None, "user_version", current_version())?;
    tx.commit()?;
    Ok(())
}
