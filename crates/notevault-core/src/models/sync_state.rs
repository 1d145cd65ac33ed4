//! Sync state model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of the last reconciliation decision for a local file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    LocalModified,
    RemoteModified,
    Conflict,
    NewLocal,
    NewRemote,
    DeletedLocal,
    DeletedRemote,
}

impl SyncStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::LocalModified => "local_modified",
            Self::RemoteModified => "remote_modified",
            Self::Conflict => "conflict",
            Self::NewLocal => "new_local",
            Self::NewRemote => "new_remote",
            Self::DeletedLocal => "deleted_local",
            Self::DeletedRemote => "deleted_remote",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "synced" => Ok(Self::Synced),
            "local_modified" => Ok(Self::LocalModified),
            "remote_modified" => Ok(Self::RemoteModified),
            "conflict" => Ok(Self::Conflict),
            "new_local" => Ok(Self::NewLocal),
            "new_remote" => Ok(Self::NewRemote),
            "deleted_local" => Ok(Self::DeletedLocal),
            "deleted_remote" => Ok(Self::DeletedRemote),
            other => Err(format!("unknown sync status '{other}'")),
        }
    }
}

/// Per-file reconciliation state, keyed by path relative to the sync root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStateRecord {
    pub local_path: String,
    pub note_uuid: Option<String>,
    /// Hash of the local file at the last successful sync
    pub local_hash: Option<String>,
    /// Hash of the remote note at the last successful sync
    pub remote_hash: Option<String>,
    pub status: SyncStatus,
    /// Unix ms
    pub last_sync_at: Option<i64>,
}

impl SyncStateRecord {
    /// A freshly reconciled record
    #[must_use]
    pub fn synced(
        local_path: impl Into<String>,
        note_uuid: impl Into<String>,
        local_hash: impl Into<String>,
        remote_hash: Option<String>,
        now: i64,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            note_uuid: Some(note_uuid.into()),
            local_hash: Some(local_hash.into()),
            remote_hash,
            status: SyncStatus::Synced,
            last_sync_at: Some(now),
        }
    }
}
