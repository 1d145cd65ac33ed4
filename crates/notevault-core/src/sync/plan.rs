//! Sync plans, actions and reports

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What a single reconciliation step does
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncActionKind {
    /// Untracked local file becomes a remote note
    CreateRemote,
    /// Untracked remote note becomes a local file
    CreateLocal,
    /// Untracked file and untracked note already match; start tracking
    Adopt,
    /// Local edits overwrite the remote note
    Push,
    /// Remote edits overwrite the local file
    Pull,
    /// Both sides changed since the last sync
    Conflict,
    /// Local file is gone; stop tracking, leave the remote note alone
    DeletedLocally,
    /// Remote note is gone; remove the local file and stop tracking
    DeletedRemotely,
}

impl SyncActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateRemote => "create-remote",
            Self::CreateLocal => "create-local",
            Self::Adopt => "adopt",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Conflict => "conflict",
            Self::DeletedLocally => "deleted-locally",
            Self::DeletedRemotely => "deleted-remotely",
        }
    }
}

impl fmt::Display for SyncActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned step, keyed by the file path relative to the sync root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncAction {
    pub kind: SyncActionKind,
    /// Relative path with `/` separators
    pub local_path: String,
    /// Remote note, when one is known
    pub note_uuid: Option<String>,
}

impl SyncAction {
    pub fn new(kind: SyncActionKind, local_path: impl Into<String>, note_uuid: Option<String>) -> Self {
        Self {
            kind,
            local_path: local_path.into(),
            note_uuid,
        }
    }
}

/// Ordered actions for one local directory and remote folder pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub local_dir: PathBuf,
    pub remote_folder: String,
    /// Sorted by local path
    pub actions: Vec<SyncAction>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of actions of the given kind
    pub fn count(&self, kind: SyncActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }
}

/// Result of executing one action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The side effect happened and the state row was rewritten
    Applied,
    /// An unforced conflict was recorded; nothing was changed
    ConflictReported,
}

/// An action that failed during [`super::SyncEngine::execute_plan`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionFailure {
    pub action: SyncAction,
    pub error: String,
}

/// Counts from executing a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created_remote: usize,
    pub created_local: usize,
    pub adopted: usize,
    pub pushed: usize,
    pub pulled: usize,
    pub conflicts: usize,
    pub deleted_locally: usize,
    pub deleted_remotely: usize,
    pub failures: Vec<ActionFailure>,
}

impl SyncReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub(super) fn record_applied(&mut self, kind: SyncActionKind) {
        let counter = match kind {
            SyncActionKind::CreateRemote => &mut self.created_remote,
            SyncActionKind::CreateLocal => &mut self.created_local,
            SyncActionKind::Adopt => &mut self.adopted,
            SyncActionKind::Push => &mut self.pushed,
            SyncActionKind::Pull => &mut self.pulled,
            SyncActionKind::Conflict => &mut self.conflicts,
            SyncActionKind::DeletedLocally => &mut self.deleted_locally,
            SyncActionKind::DeletedRemotely => &mut self.deleted_remotely,
        };
        *counter += 1;
    }
}
