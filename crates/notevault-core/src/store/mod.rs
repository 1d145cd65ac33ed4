//! Content-addressed version history
//!
//! Each distinct plaintext of a note is kept as one compressed JSON file
//! under a date-bucketed directory tree, indexed by the `versions` table.
//! A save whose canonical plaintext matches the latest version is a no-op.

mod snapshot;

use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;

use crate::db::{Database, SqliteVersionRepository, VersionRepository};
use crate::error::{Error, Result};
use crate::hash::content_hash;
use crate::models::{DecodedContent, NoteMeta, VersionRecord};
use crate::util::{now_millis, sanitize_file_stem};

pub use snapshot::{VersionSnapshot, FORMAT_VERSION};

/// Version files plus their index
///
/// The index connection is the single writer for the `versions` table; the
/// lock is held across the whole read-decide-write sequence of a save.
pub struct VersionStore {
    root: PathBuf,
    db: Mutex<Database>,
}

impl VersionStore {
    /// Create a store writing files under `root` and indexing them in `db`
    pub fn new(root: impl Into<PathBuf>, db: Database) -> Self {
        Self {
            root: root.into(),
            db: Mutex::new(db),
        }
    }

    /// Open the index at `index_path` and use `root` for version files
    pub fn open(root: impl Into<PathBuf>, index_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(root, Database::open(index_path)?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `content` as the next version of `note` unless it is
    /// unchanged
    ///
    /// Returns the latest existing record when the canonical plaintext is
    /// identical to it.
    pub fn save_version(
        &self,
        note: &NoteMeta,
        content: &DecodedContent,
        source_modified_at: Option<i64>,
    ) -> Result<VersionRecord> {
        let hash = content_hash(&content.plaintext);

        let db = self.db.lock();
        let repo = SqliteVersionRepository::new(db.connection());

        if let Some(latest) = repo.latest(&note.uuid)? {
            if self.stored_hash(&latest) == hash {
                tracing::debug!(
                    "Note {} unchanged since version {}",
                    note.uuid,
                    latest.version_number
                );
                return Ok(latest);
            }
        }

        let version_number = repo.next_version_number(&note.uuid)?;
        let captured_at = now_millis();
        let storage_path = storage_path_for(&note.uuid, version_number, captured_at)?;

        let snapshot = VersionSnapshot {
            format_version: FORMAT_VERSION,
            note_id: note.uuid.clone(),
            title: note.title.clone(),
            folder_path: note.folder_path.clone(),
            version_number,
            captured_at,
            source_modified_at,
            content_hash: hash.clone(),
            plaintext: content.plaintext.clone(),
            markdown: content.markdown.clone(),
            html: content.html.clone(),
            has_embedded_objects: content.has_embedded_objects,
            character_count: content.character_count(),
            word_count: content.word_count(),
        };
        snapshot::write(&self.root.join(&storage_path), &snapshot)?;

        let mut record = VersionRecord {
            id: 0,
            note_id: note.uuid.clone(),
            version_number,
            content_hash: hash,
            storage_path,
            captured_at,
            character_count: snapshot.character_count,
            word_count: snapshot.word_count,
            source_modified_at,
        };
        record.id = repo.insert(&record)?;

        tracing::info!(
            "Saved version {} of '{}' ({})",
            record.version_number,
            note.title,
            note.uuid
        );
        Ok(record)
    }

    /// Hash of the latest persisted content, from its file when readable
    fn stored_hash(&self, latest: &VersionRecord) -> String {
        match self.load_version(&latest.storage_path) {
            Ok(snapshot) => content_hash(&snapshot.plaintext),
            Err(error) => {
                tracing::warn!(
                    "Could not read {}, comparing against indexed hash: {error}",
                    latest.storage_path
                );
                latest.content_hash.clone()
            }
        }
    }

    /// Load a version file by its path relative to the version root
    pub fn load_version(&self, storage_path: &str) -> Result<VersionSnapshot> {
        snapshot::read(&self.resolve(storage_path)?)
    }

    /// Versions of a note, newest first
    pub fn list_versions(&self, note_id: &str) -> Result<Vec<VersionRecord>> {
        let db = self.db.lock();
        let mut versions = SqliteVersionRepository::new(db.connection()).list(note_id)?;
        versions.reverse();
        Ok(versions)
    }

    pub fn latest_version(&self, note_id: &str) -> Result<Option<VersionRecord>> {
        let db = self.db.lock();
        SqliteVersionRepository::new(db.connection()).latest(note_id)
    }

    pub fn get_version(&self, note_id: &str, version_number: u32) -> Result<Option<VersionRecord>> {
        let db = self.db.lock();
        SqliteVersionRepository::new(db.connection()).get(note_id, version_number)
    }

    /// Ids of every note with stored versions
    pub fn note_ids(&self) -> Result<Vec<String>> {
        let db = self.db.lock();
        SqliteVersionRepository::new(db.connection()).note_ids()
    }

    /// Delete all but the newest `keep` versions of a note
    ///
    /// Index rows go first, in one transaction, so a failure leaves the
    /// history intact. File removal afterwards is best effort: a file that
    /// cannot be removed is logged and left behind as an orphan. Returns the
    /// number of versions removed from the index.
    pub fn prune(&self, note_id: &str, keep: usize) -> Result<usize> {
        if keep == 0 {
            return Err(Error::InvalidInput(
                "retention must keep at least one version".to_string(),
            ));
        }

        let db = self.db.lock();
        let tx = db.connection().unchecked_transaction()?;
        let repo = SqliteVersionRepository::new(&tx);
        let versions = repo.list(note_id)?;
        let excess = versions.len().saturating_sub(keep);
        let removed = &versions[..excess];

        for version in removed {
            repo.delete(version.id)?;
        }
        tx.commit()?;

        for version in removed {
            match self.resolve(&version.storage_path) {
                Ok(path) => {
                    if let Err(error) = std::fs::remove_file(&path) {
                        tracing::warn!("Failed to remove version file {}: {error}", path.display());
                    }
                }
                Err(error) => tracing::warn!("Skipping file removal: {error}"),
            }
        }

        if excess > 0 {
            tracing::info!("Pruned {excess} version(s) of {note_id}, kept {keep}");
        }
        Ok(excess)
    }

    /// Join a relative storage path onto the root, refusing escapes
    fn resolve(&self, storage_path: &str) -> Result<PathBuf> {
        let relative = Path::new(storage_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if storage_path.is_empty() || escapes {
            return Err(Error::InvalidInput(format!(
                "storage path '{storage_path}' must be relative to the version root"
            )));
        }
        Ok(self.root.join(relative))
    }
}

/// `YYYY/MM/DD/<uuid>-v<NNN>.json.gz`, bucketed by capture date (UTC)
fn storage_path_for(note_id: &str, version_number: u32, captured_at: i64) -> Result<String> {
    let captured = chrono::DateTime::from_timestamp_millis(captured_at)
        .ok_or_else(|| Error::Storage(format!("capture time {captured_at} out of range")))?;
    let stem = sanitize_file_stem(note_id, "note");
    Ok(format!(
        "{}/{stem}-v{version_number:03}.json.gz",
        captured.format("%Y/%m/%d")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use crate::test_support::note_payload;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, VersionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = VersionStore::new(dir.path().join("versions"), Database::open_in_memory().unwrap());
        (dir, store)
    }

    fn content(text: &str) -> DecodedContent {
        decode(&note_payload(text, &[])).unwrap()
    }

    fn meta() -> NoteMeta {
        NoteMeta::new("note-1", "Groceries", "Notes")
    }

    #[test]
    fn test_identical_save_is_noop() {
        let (_dir, store) = setup();

        let first = store.save_version(&meta(), &content("milk"), Some(1)).unwrap();
        let second = store.save_version(&meta(), &content("milk"), Some(2)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_versions("note-1").unwrap().len(), 1);
    }

    #[test]
    fn test_trailing_whitespace_is_not_a_change() {
        let (_dir, store) = setup();

        store.save_version(&meta(), &content("milk"), None).unwrap();
        let again = store.save_version(&meta(), &content("milk\n\n"), None).unwrap();

        assert_eq!(again.version_number, 1);
    }

    #[test]
    fn test_version_numbers_are_sequential() {
        let (_dir, store) = setup();

        for text in ["one", "two", "three"] {
            store.save_version(&meta(), &content(text), None).unwrap();
        }

        let numbers: Vec<u32> = store
            .list_versions("note-1")
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(numbers, vec![3, 2, 1]);
        assert_eq!(store.latest_version("note-1").unwrap().unwrap().version_number, 3);
    }

    #[test]
    fn test_storage_layout_and_snapshot_contents() {
        let (_dir, store) = setup();

        let record = store.save_version(&meta(), &content("milk and eggs"), Some(42)).unwrap();
        let pattern = regex::Regex::new(r"^\d{4}/\d{2}/\d{2}/note-1-v001\.json\.gz$").unwrap();
        assert!(pattern.is_match(&record.storage_path), "{}", record.storage_path);
        assert!(store.root().join(&record.storage_path).is_file());

        let snapshot = store.load_version(&record.storage_path).unwrap();
        assert_eq!(snapshot.format_version, FORMAT_VERSION);
        assert_eq!(snapshot.title, "Groceries");
        assert_eq!(snapshot.plaintext, "milk and eggs");
        assert_eq!(snapshot.source_modified_at, Some(42));
        assert_eq!(snapshot.content_hash, record.content_hash);
        assert_eq!(snapshot.word_count, 3);
        assert_eq!(record.character_count, 13);
    }

    #[test]
    fn test_unreadable_latest_falls_back_to_index_hash() {
        let (_dir, store) = setup();

        let first = store.save_version(&meta(), &content("milk"), None).unwrap();
        std::fs::remove_file(store.root().join(&first.storage_path)).unwrap();

        let again = store.save_version(&meta(), &content("milk"), None).unwrap();
        assert_eq!(again.id, first.id);

        let changed = store.save_version(&meta(), &content("bread"), None).unwrap();
        assert_eq!(changed.version_number, 2);
    }

    #[test]
    fn test_prune_keeps_newest() {
        let (_dir, store) = setup();

        let mut records = Vec::new();
        for text in ["v1", "v2", "v3", "v4", "v5"] {
            records.push(store.save_version(&meta(), &content(text), None).unwrap());
        }

        assert_eq!(store.prune("note-1", 3).unwrap(), 2);

        let remaining: Vec<u32> = store
            .list_versions("note-1")
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(remaining, vec![5, 4, 3]);

        assert!(!store.root().join(&records[0].storage_path).exists());
        assert!(!store.root().join(&records[1].storage_path).exists());
        assert!(store.root().join(&records[2].storage_path).exists());

        // Nothing left to prune
        assert_eq!(store.prune("note-1", 3).unwrap(), 0);
    }

    #[test]
    fn test_prune_removes_row_when_file_is_gone() {
        let (_dir, store) = setup();

        let first = store.save_version(&meta(), &content("a"), None).unwrap();
        store.save_version(&meta(), &content("b"), None).unwrap();
        std::fs::remove_file(store.root().join(&first.storage_path)).unwrap();

        assert_eq!(store.prune("note-1", 1).unwrap(), 1);
        assert!(store.get_version("note-1", 1).unwrap().is_none());
    }

    #[test]
    fn test_failed_prune_keeps_rows_and_files() {
        let (_dir, store) = setup();

        let mut records = Vec::new();
        for text in ["v1", "v2", "v3", "v4", "v5"] {
            records.push(store.save_version(&meta(), &content(text), None).unwrap());
        }
        store
            .db
            .lock()
            .connection()
            .execute_batch(
                "CREATE TRIGGER keep_v2 BEFORE DELETE ON versions
                 WHEN OLD.version_number = 2
                 BEGIN SELECT RAISE(ABORT, 'version 2 is pinned'); END;",
            )
            .unwrap();

        assert!(matches!(store.prune("note-1", 3), Err(Error::Database(_))));

        assert_eq!(store.list_versions("note-1").unwrap().len(), 5);
        for record in &records {
            assert!(store.root().join(&record.storage_path).exists());
        }
    }

    #[test]
    fn test_prune_rejects_zero() {
        let (_dir, store) = setup();
        assert!(matches!(store.prune("note-1", 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_load_rejects_escaping_paths() {
        let (_dir, store) = setup();
        assert!(matches!(
            store.load_version("../outside.json.gz"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.load_version("/etc/passwd"),
            Err(Error::InvalidInput(_))
        ));
    }
}
