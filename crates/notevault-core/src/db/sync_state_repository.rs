//! Sync state repository

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{SyncStateRecord, SyncStatus};

/// Trait for three-way sync bookkeeping
pub trait SyncStateRepository {
    fn get(&self, local_path: &str) -> Result<Option<SyncStateRecord>>;

    /// All records, ordered by path
    fn list(&self) -> Result<Vec<SyncStateRecord>>;

    /// Insert or replace the record for its path
    fn upsert(&self, record: &SyncStateRecord) -> Result<()>;

    fn set_status(&self, local_path: &str, status: SyncStatus) -> Result<()>;

    fn delete(&self, local_path: &str) -> Result<()>;
}

/// `SQLite` implementation of `SyncStateRepository`
pub struct SqliteSyncStateRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSyncStateRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncStateRecord> {
        let status: String = row.get(4)?;
        Ok(SyncStateRecord {
            local_path: row.get(0)?,
            note_uuid: row.get(1)?,
            local_hash: row.get(2)?,
            remote_hash: row.get(3)?,
            status: status.parse().unwrap_or(SyncStatus::Conflict),
            last_sync_at: row.get(5)?,
        })
    }
}

impl SyncStateRepository for SqliteSyncStateRepository<'_> {
    fn get(&self, local_path: &str) -> Result<Option<SyncStateRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT local_path, note_uuid, local_hash, remote_hash, status, last_sync_at
                 FROM sync_state WHERE local_path = ?",
                params![local_path],
                Self::parse_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list(&self) -> Result<Vec<SyncStateRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT local_path, note_uuid, local_hash, remote_hash, status, last_sync_at
             FROM sync_state ORDER BY local_path",
        )?;

        let records = stmt
            .query_map([], Self::parse_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn upsert(&self, record: &SyncStateRecord) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sync_state
                (local_path, note_uuid, local_hash, remote_hash, status, last_sync_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.local_path,
                record.note_uuid,
                record.local_hash,
                record.remote_hash,
                record.status.as_str(),
                record.last_sync_at,
            ],
        )?;
        Ok(())
    }

    fn set_status(&self, local_path: &str, status: SyncStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE sync_state SET status = ? WHERE local_path = ?",
            params![status.as_str(), local_path],
        )?;
        Ok(())
    }

    fn delete(&self, local_path: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_state WHERE local_path = ?", params![local_path])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upsert_get_and_list() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteSyncStateRepository::new(db.connection());

        let b = SyncStateRecord::synced("b.md", "u2", "lb", Some("rb".to_string()), 10);
        let a = SyncStateRecord::synced("a.md", "u1", "la", Some("ra".to_string()), 10);
        repo.upsert(&b).unwrap();
        repo.upsert(&a).unwrap();

        assert_eq!(repo.get("a.md").unwrap(), Some(a.clone()));
        assert_eq!(repo.get("b.md").unwrap(), Some(b.clone()));
        assert_eq!(repo.list().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_set_status_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteSyncStateRepository::new(db.connection());

        repo.upsert(&SyncStateRecord::synced("a.md", "u1", "l", None, 1)).unwrap();
        repo.set_status("a.md", SyncStatus::Conflict).unwrap();

        let record = repo.get("a.md").unwrap().unwrap();
        assert_eq!(record.status, SyncStatus::Conflict);
        assert_eq!(record.local_hash.as_deref(), Some("l"));

        repo.delete("a.md").unwrap();
        assert!(repo.get("a.md").unwrap().is_none());
    }
}
