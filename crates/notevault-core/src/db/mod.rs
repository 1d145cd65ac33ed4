//! Index database layer

mod connection;
mod migrations;
mod note_state_repository;
mod sync_state_repository;
mod version_repository;

pub use connection::Database;
pub use note_state_repository::{NoteStateRepository, SqliteNoteStateRepository};
pub use sync_state_repository::{SqliteSyncStateRepository, SyncStateRepository};
pub use version_repository::{SqliteVersionRepository, VersionRepository};
