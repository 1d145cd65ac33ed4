//! Three-way sync between a directory of markdown files and a remote folder
//!
//! Each tracked file remembers the local and remote content hashes seen at
//! its last successful sync. A side whose current hash differs from the
//! remembered one has changed; both changing is a conflict. Wall-clock
//! timestamps are never consulted.

mod markdown;
mod plan;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use walkdir::{DirEntry, WalkDir};

use crate::db::{Database, SqliteSyncStateRepository, SyncStateRepository};
use crate::decoder::NoteDecoder;
use crate::error::{Error, Result};
use crate::hash::content_hash;
use crate::models::{SourceNote, SyncStateRecord, SyncStatus};
use crate::source::{NoteSink, NoteSource};
use crate::util::{now_millis, sanitize_file_stem};

pub use markdown::markdown_to_html;
pub use plan::{ActionFailure, ActionOutcome, SyncAction, SyncActionKind, SyncPlan, SyncReport};

/// Extension of mirrored note files
const NOTE_EXTENSION: &str = "md";

/// Conflict overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Resolve conflicts by pushing the local file
    pub force_local: bool,
    /// Resolve conflicts by pulling the remote note
    pub force_remote: bool,
}

/// Plans and executes reconciliation between a local tree and the note
/// application
pub struct SyncEngine {
    source: Arc<dyn NoteSource>,
    sink: Arc<dyn NoteSink>,
    db: Mutex<Database>,
    decoder: NoteDecoder,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(source: Arc<dyn NoteSource>, sink: Arc<dyn NoteSink>, db: Database) -> Self {
        Self {
            source,
            sink,
            db: Mutex::new(db),
            decoder: NoteDecoder::default(),
            options: SyncOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_decoder(mut self, decoder: NoteDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    #[must_use]
    pub const fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Compare the local tree, the remote folder and the recorded state
    pub fn plan(&self, local_dir: impl AsRef<Path>, remote_folder: &str) -> Result<SyncPlan> {
        if self.options.force_local && self.options.force_remote {
            return Err(Error::InvalidInput(
                "force-local and force-remote are mutually exclusive".to_string(),
            ));
        }

        let local_dir = local_dir.as_ref();
        let local_files = scan_local(local_dir)?;
        let remote_notes: HashMap<String, SourceNote> = self
            .source
            .list_notes()?
            .into_iter()
            .map(|note| (note.uuid.clone(), note))
            .collect();

        let db = self.db.lock();
        let records = SqliteSyncStateRepository::new(db.connection()).list()?;

        let mut actions = Vec::new();
        let mut claimed_paths: HashSet<String> = local_files.keys().cloned().collect();
        let mut taken_uuids = HashSet::new();

        for record in &records {
            claimed_paths.insert(record.local_path.clone());
            if let Some(uuid) = &record.note_uuid {
                taken_uuids.insert(uuid.clone());
            }

            let local = local_files.get(&record.local_path);
            let remote = record.note_uuid.as_ref().and_then(|uuid| remote_notes.get(uuid));

            let kind = match (local, remote) {
                (Some(path), Some(note)) => self.classify(record, path, note),
                (None, _) => Some(SyncActionKind::DeletedLocally),
                (Some(_), None) => Some(SyncActionKind::DeletedRemotely),
            };

            if let Some(kind) = kind {
                actions.push(SyncAction::new(kind, &record.local_path, record.note_uuid.clone()));
            }
        }

        for (relative, path) in &local_files {
            if records.iter().any(|r| &r.local_path == relative) {
                continue;
            }
            let Some(action) =
                self.classify_untracked(relative, path, remote_folder, &remote_notes, &taken_uuids)
            else {
                continue;
            };
            if let Some(uuid) = &action.note_uuid {
                taken_uuids.insert(uuid.clone());
            }
            actions.push(action);
        }

        let mut new_remote: Vec<&SourceNote> = remote_notes
            .values()
            .filter(|note| note.folder_path == remote_folder && !note.is_locked)
            .filter(|note| !taken_uuids.contains(&note.uuid))
            .collect();
        new_remote.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.uuid.cmp(&b.uuid)));

        for note in new_remote {
            let stem = sanitize_file_stem(&note.title, &note.uuid);
            let expected = format!("{stem}.{NOTE_EXTENSION}");
            let path = unclaimed_path(&stem, &expected, &claimed_paths);
            claimed_paths.insert(path.clone());
            actions.push(SyncAction::new(
                SyncActionKind::CreateLocal,
                path,
                Some(note.uuid.clone()),
            ));
        }

        actions.sort_by(|a, b| a.local_path.cmp(&b.local_path).then(a.kind.cmp(&b.kind)));

        Ok(SyncPlan {
            local_dir: local_dir.to_path_buf(),
            remote_folder: remote_folder.to_string(),
            actions,
        })
    }

    /// Decide what a tracked file present on both sides needs
    fn classify(
        &self,
        record: &SyncStateRecord,
        path: &Path,
        note: &SourceNote,
    ) -> Option<SyncActionKind> {
        if note.is_locked {
            tracing::debug!("Skipping {}: remote note is locked", record.local_path);
            return None;
        }

        let local_hash = match fs::read_to_string(path) {
            Ok(text) => content_hash(&text),
            Err(error) => {
                tracing::warn!("Skipping {}: {error}", record.local_path);
                return None;
            }
        };
        let remote_hash = match self.decoder.decode(&note.raw_payload) {
            Ok(content) => content_hash(&content.plaintext),
            Err(error) => {
                tracing::warn!("Skipping {}: remote note unreadable: {error}", record.local_path);
                return None;
            }
        };

        let local_changed = record.local_hash.as_deref() != Some(local_hash.as_str());
        let remote_changed = record.remote_hash.as_deref() != Some(remote_hash.as_str());

        match (local_changed, remote_changed) {
            (true, true) if self.options.force_local => Some(SyncActionKind::Push),
            (true, true) if self.options.force_remote => Some(SyncActionKind::Pull),
            (true, true) => Some(SyncActionKind::Conflict),
            (true, false) => Some(SyncActionKind::Push),
            (false, true) => Some(SyncActionKind::Pull),
            (false, false) => None,
        }
    }

    /// Decide what an untracked local file needs
    ///
    /// A file whose name matches an untracked note in the folder is only
    /// linked to it when both hold the same text; otherwise the pair is a
    /// conflict. Notes already tracked under another path never match, so
    /// such a file becomes a new note.
    fn classify_untracked(
        &self,
        relative: &str,
        path: &Path,
        remote_folder: &str,
        remote_notes: &HashMap<String, SourceNote>,
        taken_uuids: &HashSet<String>,
    ) -> Option<SyncAction> {
        let stem = Path::new(relative)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let matching = remote_notes
            .values()
            .filter(|note| note.folder_path == remote_folder && !note.is_locked)
            .filter(|note| !taken_uuids.contains(&note.uuid))
            .filter(|note| sanitize_file_stem(&note.title, &note.uuid) == stem)
            .min_by(|a, b| a.uuid.cmp(&b.uuid));

        let Some(note) = matching else {
            return Some(SyncAction::new(SyncActionKind::CreateRemote, relative, None));
        };

        let local_hash = match fs::read_to_string(path) {
            Ok(text) => content_hash(&text),
            Err(error) => {
                tracing::warn!("Skipping {relative}: {error}");
                return None;
            }
        };
        let remote_hash = match self.decoder.decode(&note.raw_payload) {
            Ok(content) => content_hash(&content.markdown),
            Err(error) => {
                tracing::warn!("Skipping {relative}: remote note unreadable: {error}");
                return None;
            }
        };

        let kind = if local_hash == remote_hash {
            SyncActionKind::Adopt
        } else if self.options.force_local {
            SyncActionKind::Push
        } else if self.options.force_remote {
            SyncActionKind::Pull
        } else {
            SyncActionKind::Conflict
        };
        Some(SyncAction::new(kind, relative, Some(note.uuid.clone())))
    }

    /// Carry out one action and rewrite its state row
    pub fn execute(&self, plan: &SyncPlan, action: &SyncAction) -> Result<ActionOutcome> {
        let db = self.db.lock();
        let repo = SqliteSyncStateRepository::new(db.connection());
        let local_path = plan.local_dir.join(&action.local_path);

        match action.kind {
            SyncActionKind::Conflict => {
                if repo.get(&action.local_path)?.is_some() {
                    repo.set_status(&action.local_path, SyncStatus::Conflict)?;
                }
                tracing::warn!("Conflict on {}: both sides changed", action.local_path);
                return Ok(ActionOutcome::ConflictReported);
            }
            SyncActionKind::DeletedLocally => {
                repo.delete(&action.local_path)?;
                tracing::info!("Stopped tracking {} (deleted locally)", action.local_path);
                return Ok(ActionOutcome::Applied);
            }
            SyncActionKind::DeletedRemotely => {
                match fs::remove_file(&local_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                repo.delete(&action.local_path)?;
                tracing::info!("Removed {} (deleted remotely)", action.local_path);
                return Ok(ActionOutcome::Applied);
            }
            SyncActionKind::Adopt => {}
            SyncActionKind::Push => {
                let uuid = required_uuid(action)?;
                let note = self.remote_note(uuid)?;
                self.ensure_addressable(&note)?;
                let markdown = fs::read_to_string(&local_path)?;
                self.sink
                    .update_note(&note.title, &markdown_to_html(&markdown), &note.folder_path)?;
            }
            SyncActionKind::Pull | SyncActionKind::CreateLocal => {
                let uuid = required_uuid(action)?;
                let note = self.remote_note(uuid)?;
                let content = self.decoder.decode(&note.raw_payload)?;
                if let Some(parent) = local_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&local_path, &content.markdown)?;
            }
            SyncActionKind::CreateRemote => {
                let uuid = self.create_remote(&local_path, &plan.remote_folder)?;
                let record = self.fresh_record(&action.local_path, &local_path, &uuid)?;
                repo.upsert(&record)?;
                tracing::info!("Created remote note for {}", action.local_path);
                return Ok(ActionOutcome::Applied);
            }
        }

        let uuid = required_uuid(action)?;
        let record = self.fresh_record(&action.local_path, &local_path, uuid)?;
        repo.upsert(&record)?;
        tracing::info!("{} {}", action.kind, action.local_path);
        Ok(ActionOutcome::Applied)
    }

    /// Execute every action in order, continuing past failures
    pub fn execute_plan(&self, plan: &SyncPlan) -> SyncReport {
        let mut report = SyncReport::default();

        for action in &plan.actions {
            match self.execute(plan, action) {
                Ok(ActionOutcome::Applied) => report.record_applied(action.kind),
                Ok(ActionOutcome::ConflictReported) => report.conflicts += 1,
                Err(error) => {
                    tracing::warn!("{} {} failed: {error}", action.kind, action.local_path);
                    report.failures.push(ActionFailure {
                        action: action.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Plan and execute in one go
    pub fn sync(&self, local_dir: impl AsRef<Path>, remote_folder: &str) -> Result<SyncReport> {
        let plan = self.plan(local_dir, remote_folder)?;
        Ok(self.execute_plan(&plan))
    }

    /// Recorded state of every tracked file
    pub fn status(&self) -> Result<Vec<SyncStateRecord>> {
        let db = self.db.lock();
        SqliteSyncStateRepository::new(db.connection()).list()
    }

    fn remote_note(&self, uuid: &str) -> Result<SourceNote> {
        self.source
            .get_note(uuid)?
            .ok_or_else(|| Error::NotFound(format!("remote note {uuid}")))
    }

    /// The sink finds notes by title, so a title shared within the folder
    /// cannot be written safely
    fn ensure_addressable(&self, note: &SourceNote) -> Result<()> {
        let sharing = self
            .source
            .list_notes()?
            .iter()
            .filter(|other| other.title == note.title && other.folder_path == note.folder_path)
            .count();
        if sharing > 1 {
            return Err(Error::Reconciliation(format!(
                "{sharing} notes in '{}' are titled '{}'; rename one before pushing",
                note.folder_path, note.title
            )));
        }
        Ok(())
    }

    /// Push a new local file as a new note, never touching existing ones
    fn create_remote(&self, local_path: &Path, folder: &str) -> Result<String> {
        let markdown = fs::read_to_string(local_path)?;
        let html = markdown_to_html(&markdown);
        let stem = local_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.trim().is_empty())
            .ok_or_else(|| {
                Error::InvalidInput(format!("{} has no usable title", local_path.display()))
            })?;

        if !self.sink.folder_exists(folder)? {
            self.sink.create_folder(folder)?;
        }

        let title = self.unused_title(&stem, folder)?;
        let created_id = self.sink.create_note(&title, &html, folder)?;

        let listed = self
            .source
            .list_notes()?
            .into_iter()
            .find(|note| note.title == title && note.folder_path == folder)
            .map(|note| note.uuid);
        Ok(listed.unwrap_or(created_id))
    }

    /// `stem`, or the first of `stem (2)`, `stem (3)`, ... free in `folder`
    fn unused_title(&self, stem: &str, folder: &str) -> Result<String> {
        let mut title = stem.to_string();
        let mut n = 1;
        while self.sink.note_exists(&title, folder)? {
            n += 1;
            title = format!("{stem} ({n})");
        }
        Ok(title)
    }

    /// Hashes of both sides as they are right now
    fn fresh_record(&self, relative: &str, local_path: &Path, uuid: &str) -> Result<SyncStateRecord> {
        let local_hash = content_hash(&fs::read_to_string(local_path)?);
        let remote_hash = match self.source.get_note(uuid)? {
            Some(note) => Some(content_hash(&self.decoder.decode(&note.raw_payload)?.plaintext)),
            None => None,
        };
        Ok(SyncStateRecord::synced(
            relative,
            uuid,
            local_hash,
            remote_hash,
            now_millis(),
        ))
    }
}

fn required_uuid(action: &SyncAction) -> Result<&str> {
    action.note_uuid.as_deref().ok_or_else(|| {
        Error::InvalidInput(format!("{} {} has no remote note", action.kind, action.local_path))
    })
}

/// First of `expected`, `stem (2).md`, `stem (3).md`, ... not yet taken
fn unclaimed_path(stem: &str, expected: &str, claimed: &HashSet<String>) -> String {
    if !claimed.contains(expected) {
        return expected.to_string();
    }
    (2..)
        .map(|n| format!("{stem} ({n}).{NOTE_EXTENSION}"))
        .find(|candidate| !claimed.contains(candidate))
        .unwrap_or_else(|| expected.to_string())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Markdown files under `root`, keyed by `/`-separated relative path
fn scan_local(root: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();
    if !root.exists() {
        return Ok(files);
    }

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some(NOTE_EXTENSION)
        {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(key, path.to_path_buf());
    }

    Ok(files)
}
