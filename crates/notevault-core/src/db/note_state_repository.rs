//! Tracked note and monitor state repository

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{MonitorState, NoteMeta, TrackedNote};

/// Trait for change monitor bookkeeping
pub trait NoteStateRepository {
    /// Insert or refresh a tracked note, clearing any tombstone
    fn upsert_note(&self, meta: &NoteMeta, now: i64) -> Result<()>;

    fn get_note(&self, uuid: &str) -> Result<Option<TrackedNote>>;

    /// Tracked notes, tombstoned ones included when `include_deleted`
    fn list_notes(&self, include_deleted: bool) -> Result<Vec<TrackedNote>>;

    /// Set the tombstone on a tracked note
    fn mark_deleted(&self, uuid: &str, now: i64) -> Result<()>;

    fn get_state(&self, uuid: &str) -> Result<Option<MonitorState>>;

    fn put_state(&self, state: &MonitorState) -> Result<()>;
}

/// `SQLite` implementation of `NoteStateRepository`
pub struct SqliteNoteStateRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteStateRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrackedNote> {
        Ok(TrackedNote {
            uuid: row.get(0)?,
            title: row.get(1)?,
            folder_path: row.get(2)?,
            first_seen_at: row.get(3)?,
            updated_at: row.get(4)?,
            is_deleted: row.get::<_, i32>(5)? != 0,
            deleted_at: row.get(6)?,
        })
    }
}

impl NoteStateRepository for SqliteNoteStateRepository<'_> {
    fn upsert_note(&self, meta: &NoteMeta, now: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notes (uuid, title, folder_path, first_seen_at, updated_at, is_deleted, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?4, 0, NULL)
             ON CONFLICT(uuid) DO UPDATE SET
                title = excluded.title,
                folder_path = excluded.folder_path,
                updated_at = excluded.updated_at,
                is_deleted = 0,
                deleted_at = NULL",
            params![meta.uuid, meta.title, meta.folder_path, now],
        )?;
        Ok(())
    }

    fn get_note(&self, uuid: &str) -> Result<Option<TrackedNote>> {
        let note = self
            .conn
            .query_row(
                "SELECT uuid, title, folder_path, first_seen_at, updated_at, is_deleted, deleted_at
                 FROM notes WHERE uuid = ?",
                params![uuid],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn list_notes(&self, include_deleted: bool) -> Result<Vec<TrackedNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, title, folder_path, first_seen_at, updated_at, is_deleted, deleted_at
             FROM notes
             WHERE ?1 OR is_deleted = 0
             ORDER BY title COLLATE NOCASE, uuid",
        )?;

        let notes = stmt
            .query_map(params![include_deleted], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    fn mark_deleted(&self, uuid: &str, now: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE notes SET is_deleted = 1, deleted_at = ?1, updated_at = ?1
             WHERE uuid = ?2 AND is_deleted = 0",
            params![now, uuid],
        )?;
        Ok(())
    }

    fn get_state(&self, uuid: &str) -> Result<Option<MonitorState>> {
        let state = self
            .conn
            .query_row(
                "SELECT note_uuid, last_hash, last_source_modified_at, last_checked_at
                 FROM monitor_state WHERE note_uuid = ?",
                params![uuid],
                |row| {
                    Ok(MonitorState {
                        note_uuid: row.get(0)?,
                        last_hash: row.get(1)?,
                        last_source_modified_at: row.get(2)?,
                        last_checked_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    fn put_state(&self, state: &MonitorState) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO monitor_state
                (note_uuid, last_hash, last_source_modified_at, last_checked_at)
             VALUES (?, ?, ?, ?)",
            params![
                state.note_uuid,
                state.last_hash,
                state.last_source_modified_at,
                state.last_checked_at,
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upsert_keeps_first_seen() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteNoteStateRepository::new(db.connection());

        repo.upsert_note(&NoteMeta::new("u1", "Old title", "Notes"), 100).unwrap();
        repo.upsert_note(&NoteMeta::new("u1", "New title", "Work"), 200).unwrap();

        let note = repo.get_note("u1").unwrap().unwrap();
        assert_eq!(note.title, "New title");
        assert_eq!(note.folder_path, "Work");
        assert_eq!(note.first_seen_at, 100);
        assert_eq!(note.updated_at, 200);
    }

    #[test]
    fn test_tombstone_and_revive() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteNoteStateRepository::new(db.connection());

        repo.upsert_note(&NoteMeta::new("u1", "A", "Notes"), 100).unwrap();
        repo.upsert_note(&NoteMeta::new("u2", "B", "Notes"), 100).unwrap();
        repo.mark_deleted("u1", 150).unwrap();

        assert_eq!(repo.list_notes(false).unwrap().len(), 1);
        assert_eq!(repo.list_notes(true).unwrap().len(), 2);
        let deleted = repo.get_note("u1").unwrap().unwrap();
        assert!(deleted.is_deleted);
        assert_eq!(deleted.deleted_at, Some(150));

        repo.upsert_note(&NoteMeta::new("u1", "A", "Notes"), 300).unwrap();
        let revived = repo.get_note("u1").unwrap().unwrap();
        assert!(!revived.is_deleted);
        assert_eq!(revived.deleted_at, None);
    }

    #[test]
    fn test_monitor_state_replace() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteNoteStateRepository::new(db.connection());

        assert!(repo.get_state("u1").unwrap().is_none());

        let mut state = MonitorState {
            note_uuid: "u1".to_string(),
            last_hash: "abc".to_string(),
            last_source_modified_at: Some(5),
            last_checked_at: 10,
        };
        repo.put_state(&state).unwrap();
        state.last_hash = "def".to_string();
        repo.put_state(&state).unwrap();

        assert_eq!(repo.get_state("u1").unwrap(), Some(state));
    }
}
