//! Boundaries to the note application
//!
//! The note source is a read-only view of the application's note store; the
//! note sink drives its automation facility. Both are implemented outside
//! this crate.

use crate::error::Result;
use crate::models::SourceNote;

/// Read-only access to the note application's store
pub trait NoteSource: Send + Sync {
    /// Every note currently in the store, locked ones included
    fn list_notes(&self) -> Result<Vec<SourceNote>>;

    /// A single note by uuid
    fn get_note(&self, uuid: &str) -> Result<Option<SourceNote>>;
}

/// Write access through the application's automation interface
///
/// Calls are synchronous and may fail with [`crate::Error::Reconciliation`].
/// Callers surface failures; nothing here retries.
pub trait NoteSink: Send + Sync {
    /// Create a note and return the uuid the source will report for it
    fn create_note(&self, title: &str, html_body: &str, folder: &str) -> Result<String>;

    /// Replace the body of the note titled `title` in `folder`
    fn update_note(&self, title: &str, html_body: &str, folder: &str) -> Result<()>;

    fn note_exists(&self, title: &str, folder: &str) -> Result<bool>;

    fn create_folder(&self, name: &str) -> Result<()>;

    fn folder_exists(&self, name: &str) -> Result<bool>;
}
