//! Read-only access to the note application's SQLite store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notevault_core::{NoteSource, Result, SourceNote};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

/// Seconds between the Unix epoch and 2001-01-01, the store's epoch
const STORE_EPOCH_OFFSET_SECS: f64 = 978_307_200.0;

const NOTE_QUERY: &str = "
    SELECT n.ZIDENTIFIER,
           COALESCE(n.ZTITLE1, ''),
           COALESCE(f.ZTITLE2, ''),
           COALESCE(n.ZMODIFICATIONDATE1, 0),
           COALESCE(n.ZISPASSWORDPROTECTED, 0),
           d.ZDATA
    FROM ZICCLOUDSYNCINGOBJECT n
    JOIN ZICNOTEDATA d ON d.ZNOTE = n.Z_PK
    LEFT JOIN ZICCLOUDSYNCINGOBJECT f ON f.Z_PK = n.ZFOLDER
    WHERE n.ZIDENTIFIER IS NOT NULL
      AND COALESCE(n.ZMARKEDFORDELETION, 0) = 0";

/// Note source backed by the application's `NoteStore.sqlite`
///
/// A fresh connection is opened for every call so each poll sees the
/// latest committed state.
pub struct AppleNotesSource {
    path: PathBuf,
}

impl AppleNotesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA query_only = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<SourceNote> {
        let modified: f64 = row.get(3)?;
        Ok(SourceNote {
            uuid: row.get(0)?,
            title: row.get(1)?,
            folder_path: row.get(2)?,
            modified_at: store_time_to_unix_millis(modified),
            is_locked: row.get::<_, i64>(4)? != 0,
            raw_payload: row.get::<_, Option<Vec<u8>>>(5)?.unwrap_or_default(),
        })
    }
}

impl NoteSource for AppleNotesSource {
    fn list_notes(&self) -> Result<Vec<SourceNote>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(NOTE_QUERY)?;
        let notes = stmt
            .query_map([], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        tracing::debug!("Read {} notes from {}", notes.len(), self.path.display());
        Ok(notes)
    }

    fn get_note(&self, uuid: &str) -> Result<Option<SourceNote>> {
        let conn = self.open()?;
        let note = conn
            .query_row(
                &format!("{NOTE_QUERY} AND n.ZIDENTIFIER = ?"),
                params![uuid],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }
}

/// Seconds since 2001-01-01 to Unix milliseconds
#[allow(clippy::cast_possible_truncation)]
pub fn store_time_to_unix_millis(seconds: f64) -> i64 {
    ((seconds + STORE_EPOCH_OFFSET_SECS) * 1000.0).round() as i64
}
