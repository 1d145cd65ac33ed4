//! Data models for notevault

mod content;
mod note;
mod sync_state;
mod version;

pub use content::{AttributeRun, DecodedContent, FontWeight, ParagraphStyle};
pub use note::{NoteMeta, SourceNote, TrackedNote};
pub use sync_state::{SyncStateRecord, SyncStatus};
pub use version::{MonitorState, VersionRecord};
