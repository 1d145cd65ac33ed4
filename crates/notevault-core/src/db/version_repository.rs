//! Version index repository

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::VersionRecord;

/// Trait for version index operations
pub trait VersionRepository {
    /// Insert a row and return its assigned id
    ///
    /// `record.id` is ignored.
    fn insert(&self, record: &VersionRecord) -> Result<i64>;

    /// Next free version number for a note (1 when it has none)
    fn next_version_number(&self, note_id: &str) -> Result<u32>;

    /// Highest-numbered version of a note
    fn latest(&self, note_id: &str) -> Result<Option<VersionRecord>>;

    fn get(&self, note_id: &str, version_number: u32) -> Result<Option<VersionRecord>>;

    /// All versions of a note, oldest first
    fn list(&self, note_id: &str) -> Result<Vec<VersionRecord>>;

    /// Distinct note ids that have at least one version
    fn note_ids(&self) -> Result<Vec<String>>;

    fn delete(&self, id: i64) -> Result<()>;
}

/// `SQLite` implementation of `VersionRepository`
pub struct SqliteVersionRepository<'a> {
    conn: &'a Connection,
}

const COLUMNS: &str = "id, note_id, version_number, content_hash, storage_path, captured_at, \
                       character_count, word_count, source_modified_at";

impl<'a> SqliteVersionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_version(row: &rusqlite::Row<'_>) -> rusqlite::Result<VersionRecord> {
        Ok(VersionRecord {
            id: row.get(0)?,
            note_id: row.get(1)?,
            version_number: row.get(2)?,
            content_hash: row.get(3)?,
            storage_path: row.get(4)?,
            captured_at: row.get(5)?,
            character_count: row.get(6)?,
            word_count: row.get(7)?,
            source_modified_at: row.get(8)?,
        })
    }
}

impl VersionRepository for SqliteVersionRepository<'_> {
    fn insert(&self, record: &VersionRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO versions (note_id, version_number, content_hash, storage_path, captured_at,
                                   character_count, word_count, source_modified_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.note_id,
                record.version_number,
                record.content_hash,
                record.storage_path,
                record.captured_at,
                record.character_count,
                record.word_count,
                record.source_modified_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn next_version_number(&self, note_id: &str) -> Result<u32> {
        let max: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(version_number), 0) FROM versions WHERE note_id = ?",
            params![note_id],
            |row| row.get(0),
        )?;
        Ok(max + 1)
    }

    fn latest(&self, note_id: &str) -> Result<Option<VersionRecord>> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM versions WHERE note_id = ?
                     ORDER BY version_number DESC LIMIT 1"
                ),
                params![note_id],
                Self::parse_version,
            )
            .optional()?;
        Ok(record)
    }

    fn get(&self, note_id: &str, version_number: u32) -> Result<Option<VersionRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM versions WHERE note_id = ? AND version_number = ?"),
                params![note_id, version_number],
                Self::parse_version,
            )
            .optional()?;
        Ok(record)
    }

    fn list(&self, note_id: &str) -> Result<Vec<VersionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM versions WHERE note_id = ? ORDER BY version_number ASC"
        ))?;

        let versions = stmt
            .query_map(params![note_id], Self::parse_version)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(versions)
    }

    fn note_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT note_id FROM versions ORDER BY note_id")?;

        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM versions WHERE id = ?", params![id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    fn record(note_id: &str, version_number: u32, hash: &str) -> VersionRecord {
        VersionRecord {
            id: 0,
            note_id: note_id.to_string(),
            version_number,
            content_hash: hash.to_string(),
            storage_path: format!("2024/01/02/{note_id}-v{version_number:03}.json.gz"),
            captured_at: 1_704_153_600_000,
            character_count: 10,
            word_count: 2,
            source_modified_at: Some(1_704_153_000_000),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteVersionRepository::new(db.connection());

        let id = repo.insert(&record("n1", 1, "aaa")).unwrap();
        let fetched = repo.get("n1", 1).unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.content_hash, "aaa");
        assert_eq!(fetched.source_modified_at, Some(1_704_153_000_000));
        assert!(repo.get("n1", 2).unwrap().is_none());
    }

    #[test]
    fn test_next_version_number_and_latest() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteVersionRepository::new(db.connection());

        assert_eq!(repo.next_version_number("n1").unwrap(), 1);
        assert!(repo.latest("n1").unwrap().is_none());

        repo.insert(&record("n1", 1, "aaa")).unwrap();
        repo.insert(&record("n1", 2, "bbb")).unwrap();
        repo.insert(&record("n2", 1, "ccc")).unwrap();

        assert_eq!(repo.next_version_number("n1").unwrap(), 3);
        assert_eq!(repo.latest("n1").unwrap().unwrap().content_hash, "bbb");
        assert_eq!(repo.note_ids().unwrap(), vec!["n1", "n2"]);
    }

    #[test]
    fn test_duplicate_version_number_rejected() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteVersionRepository::new(db.connection());

        repo.insert(&record("n1", 1, "aaa")).unwrap();
        assert!(repo.insert(&record("n1", 1, "bbb")).is_err());
    }

    #[test]
    fn test_list_is_ascending_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteVersionRepository::new(db.connection());

        for n in [2, 1, 3] {
            repo.insert(&record("n1", n, "h")).unwrap();
        }
        let numbers: Vec<u32> = repo.list("n1").unwrap().iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        let first = repo.get("n1", 1).unwrap().unwrap();
        repo.delete(first.id).unwrap();
        assert_eq!(repo.list("n1").unwrap().len(), 2);
    }
}
