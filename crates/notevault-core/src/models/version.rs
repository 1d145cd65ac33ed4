//! Version history models

use serde::{Deserialize, Serialize};

/// Index row describing one persisted version of a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Row identifier assigned by the index
    pub id: i64,
    pub note_id: String,
    /// Per-note sequence number, starting at 1
    pub version_number: u32,
    /// Digest of the canonical plaintext
    pub content_hash: String,
    /// Path of the version file, relative to the version root
    pub storage_path: String,
    /// Capture timestamp (Unix ms)
    pub captured_at: i64,
    pub character_count: usize,
    pub word_count: usize,
    /// Modification time reported by the source, if known (Unix ms)
    pub source_modified_at: Option<i64>,
}

/// Last observed state of a note, used by the change monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    pub note_uuid: String,
    pub last_hash: String,
    pub last_source_modified_at: Option<i64>,
    pub last_checked_at: i64,
}
