//! Error types for notevault-core

use thiserror::Error;

use crate::decoder::FormatError;

/// Result type alias using notevault-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notevault-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Note payload could not be decoded
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Compression, decompression or version file failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Note sink automation failure while executing a sync action
    #[error("Reconciliation error: {0}")]
    Reconciliation(String),

    /// Missing note, version or folder
    #[error("Not found: {0}")]
    NotFound(String),

    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or saved
    #[error("Configuration error: {0}")]
    Config(String),

    /// A monitor check was requested while another one is still running
    #[error("A change check is already in progress")]
    CheckInProgress,
}
