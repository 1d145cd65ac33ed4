use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] notevault_core::Error),
    #[error(transparent)]
    Format(#[from] notevault_core::FormatError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No stored versions for note {0}")]
    NoteNotFound(String),
    #[error("Note {note} has no version {version}")]
    VersionNotFound { note: String, version: u32 },
    #[error(
        "No retention configured. Pass --keep or run `notevault config init --retention N`."
    )]
    RetentionNotConfigured,
    #[error("{0} sync action(s) failed")]
    SyncFailures(usize),
    #[error("Background task failed: {0}")]
    Task(String),
}
