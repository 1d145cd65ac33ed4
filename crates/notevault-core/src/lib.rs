//! notevault-core - Core library for notevault
//!
//! This crate decodes the note application's compressed binary note format,
//! keeps a deduplicated version history of note content, watches the note
//! source for changes and reconciles a plain-text mirror on disk with the
//! remote note collection.

pub mod config;
pub mod db;
pub mod decoder;
pub mod error;
pub mod export;
pub mod hash;
pub mod models;
pub mod monitor;
pub mod source;
pub mod store;
pub mod sync;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use decoder::{decode, FormatError, NoteDecoder};
pub use error::{Error, Result};
pub use models::{AttributeRun, DecodedContent, SourceNote, VersionRecord};
pub use monitor::{ChangeMonitor, CheckSummary};
pub use source::{NoteSink, NoteSource};
pub use store::VersionStore;
pub use sync::{SyncEngine, SyncOptions};
