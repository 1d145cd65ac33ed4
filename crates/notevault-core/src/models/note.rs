//! Note models

use serde::{Deserialize, Serialize};

/// A note as reported by the note source
///
/// Owned by the note application; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNote {
    /// Stable, globally unique identifier
    pub uuid: String,
    /// Note title
    pub title: String,
    /// Folder the note lives in
    pub folder_path: String,
    /// Last modification timestamp reported by the source (Unix ms)
    pub modified_at: i64,
    /// Password protected notes are never decoded
    pub is_locked: bool,
    /// Opaque note body in the application's native encoding
    #[serde(skip)]
    pub raw_payload: Vec<u8>,
}

impl SourceNote {
    /// Identity fields of this note, without its payload
    #[must_use]
    pub fn meta(&self) -> NoteMeta {
        NoteMeta {
            uuid: self.uuid.clone(),
            title: self.title.clone(),
            folder_path: self.folder_path.clone(),
        }
    }
}

/// Identity of a note recorded alongside each stored version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMeta {
    pub uuid: String,
    pub title: String,
    pub folder_path: String,
}

impl NoteMeta {
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        title: impl Into<String>,
        folder_path: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            title: title.into(),
            folder_path: folder_path.into(),
        }
    }
}

/// A note the monitor has observed at least once
///
/// Deleted notes keep their row with `is_deleted` set so their version
/// history stays reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedNote {
    pub uuid: String,
    pub title: String,
    pub folder_path: String,
    /// First observation (Unix ms)
    pub first_seen_at: i64,
    /// Last time the row was refreshed (Unix ms)
    pub updated_at: i64,
    /// Tombstone flag set when the note disappears from the source
    pub is_deleted: bool,
    pub deleted_at: Option<i64>,
}
