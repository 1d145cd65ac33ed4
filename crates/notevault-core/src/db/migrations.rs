//! Database migrations

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version
pub(crate) const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &Connection) -> Result<()> {
    let version = current_version(conn)?;

    if version < 1 {
        apply(conn, 1, MIGRATION_V1)?;
    }
    if version < 2 {
        apply(conn, 2, MIGRATION_V2)?;
    }

    Ok(())
}

/// Get the current schema version
pub fn current_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Apply one migration and record it, atomically
fn apply(conn: &Connection, version: i32, sql: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?)",
        [version],
    )?;
    tx.commit()?;

    tracing::info!("Migrated index database to version {version}");
    Ok(())
}

/// Version 1: tracked notes, version index, monitor state
const MIGRATION_V1: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY
    );

    CREATE TABLE IF NOT EXISTS notes (
        uuid TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        folder_path TEXT NOT NULL,
        first_seen_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        deleted_at INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_notes_deleted ON notes(is_deleted);

    CREATE TABLE IF NOT EXISTS versions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        note_id TEXT NOT NULL,
        version_number INTEGER NOT NULL,
        content_hash TEXT NOT NULL,
        storage_path TEXT NOT NULL,
        captured_at INTEGER NOT NULL,
        character_count INTEGER NOT NULL,
        word_count INTEGER NOT NULL,
        source_modified_at INTEGER,
        UNIQUE(note_id, version_number)
    );
    CREATE INDEX IF NOT EXISTS idx_versions_note ON versions(note_id, version_number DESC);

    CREATE TABLE IF NOT EXISTS monitor_state (
        note_uuid TEXT PRIMARY KEY,
        last_hash TEXT NOT NULL,
        last_source_modified_at INTEGER,
        last_checked_at INTEGER NOT NULL
    );
";

/// Version 2: three-way sync state
const MIGRATION_V2: &str = "
    CREATE TABLE IF NOT EXISTS sync_state (
        local_path TEXT PRIMARY KEY,
        note_uuid TEXT,
        local_hash TEXT,
        remote_hash TEXT,
        status TEXT NOT NULL,
        last_sync_at INTEGER
    );
    CREATE INDEX IF NOT EXISTS idx_sync_state_uuid ON sync_state(note_uuid);
";
