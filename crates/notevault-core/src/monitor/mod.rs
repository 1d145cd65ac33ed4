//! Change monitor
//!
//! Compares every note in the source against the last hash it was seen with
//! and records a new version for anything created or changed. Notes that
//! vanish from the source are tombstoned; their history is kept.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::db::{Database, NoteStateRepository, SqliteNoteStateRepository};
use crate::decoder::NoteDecoder;
use crate::error::{Error, Result};
use crate::hash::content_hash;
use crate::models::{MonitorState, SourceNote, TrackedNote};
use crate::source::NoteSource;
use crate::store::VersionStore;
use crate::util::now_millis;

/// Counts from one pass over the note source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub created: usize,
    pub changed: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Password protected notes that were skipped
    pub locked: usize,
    /// Notes that could not be decoded or saved
    pub failed: usize,
}

impl CheckSummary {
    /// Whether this pass stored any new version or tombstone
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.created + self.changed + self.deleted > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    Created,
    Changed,
    Unchanged,
}

/// Polls a [`NoteSource`] and feeds the [`VersionStore`]
pub struct ChangeMonitor {
    source: Arc<dyn NoteSource>,
    store: Arc<VersionStore>,
    db: Mutex<Database>,
    decoder: NoteDecoder,
    retention: Option<usize>,
    checking: AtomicBool,
}

impl ChangeMonitor {
    /// `db` holds the monitor's own state tables
    pub fn new(source: Arc<dyn NoteSource>, store: Arc<VersionStore>, db: Database) -> Self {
        Self {
            source,
            store,
            db: Mutex::new(db),
            decoder: NoteDecoder::default(),
            retention: None,
            checking: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn with_decoder(mut self, decoder: NoteDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Prune each note down to `keep` versions right after saving a new one
    #[must_use]
    pub const fn with_retention(mut self, keep: Option<usize>) -> Self {
        self.retention = keep;
        self
    }

    pub fn is_checking(&self) -> bool {
        self.checking.load(Ordering::Acquire)
    }

    /// Run one full comparison pass
    ///
    /// Fails with [`Error::CheckInProgress`] when another pass is still
    /// running, and with the source's error when notes cannot be listed.
    /// Per-note failures are counted in [`CheckSummary::failed`].
    pub fn check_once(&self) -> Result<CheckSummary> {
        let _guard = CheckGuard::acquire(&self.checking)?;

        let notes = self.source.list_notes()?;
        let now = now_millis();
        let mut summary = CheckSummary::default();
        let mut present = HashSet::with_capacity(notes.len());

        let db = self.db.lock();
        let repo = SqliteNoteStateRepository::new(db.connection());

        for note in &notes {
            // Locked notes stay present so they are never tombstoned
            present.insert(note.uuid.as_str());
            if note.is_locked {
                summary.locked += 1;
                continue;
            }

            match self.observe(&repo, note, now) {
                Ok(Observation::Created) => summary.created += 1,
                Ok(Observation::Changed) => summary.changed += 1,
                Ok(Observation::Unchanged) => summary.unchanged += 1,
                Err(error) => {
                    tracing::warn!("Failed to process note {} ('{}'): {error}", note.uuid, note.title);
                    summary.failed += 1;
                }
            }
        }

        for tracked in repo.list_notes(false)? {
            if !present.contains(tracked.uuid.as_str()) {
                repo.mark_deleted(&tracked.uuid, now)?;
                tracing::info!("Note '{}' ({}) was deleted", tracked.title, tracked.uuid);
                summary.deleted += 1;
            }
        }

        tracing::debug!(?summary, "Change check finished");
        Ok(summary)
    }

    fn observe(
        &self,
        repo: &SqliteNoteStateRepository<'_>,
        note: &SourceNote,
        now: i64,
    ) -> Result<Observation> {
        let content = self.decoder.decode(&note.raw_payload)?;
        let hash = content_hash(&content.plaintext);

        let observation = match repo.get_state(&note.uuid)? {
            None => Observation::Created,
            Some(state) if state.last_hash != hash => Observation::Changed,
            Some(_) => Observation::Unchanged,
        };

        if observation != Observation::Unchanged {
            let meta = note.meta();
            self.store
                .save_version(&meta, &content, Some(note.modified_at))?;
            if let Some(keep) = self.retention {
                if let Err(error) = self.store.prune(&note.uuid, keep) {
                    tracing::warn!("Failed to prune versions of {}: {error}", note.uuid);
                }
            }
        }

        repo.upsert_note(&note.meta(), now)?;
        repo.put_state(&MonitorState {
            note_uuid: note.uuid.clone(),
            last_hash: hash,
            last_source_modified_at: Some(note.modified_at),
            last_checked_at: now,
        })?;

        Ok(observation)
    }

    /// Notes seen so far, optionally including tombstoned ones
    pub fn tracked_notes(&self, include_deleted: bool) -> Result<Vec<TrackedNote>> {
        let db = self.db.lock();
        SqliteNoteStateRepository::new(db.connection()).list_notes(include_deleted)
    }

    pub fn tracked_note(&self, uuid: &str) -> Result<Option<TrackedNote>> {
        let db = self.db.lock();
        SqliteNoteStateRepository::new(db.connection()).get_note(uuid)
    }
}

/// Clears the in-progress flag when a check ends, however it ends
struct CheckGuard<'a>(&'a AtomicBool);

impl<'a> CheckGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::CheckInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for CheckGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
