use notevault_core::config::VaultConfig;
use notevault_core::db::{Database, NoteStateRepository, SqliteNoteStateRepository};
use notevault_core::store::VersionSnapshot;
use notevault_core::{DecodedContent, VersionStore};

use crate::cli::{ContentFormat, VersionsCommands};
use crate::commands::common::{format_tracked_lines, format_version_lines, open_store, render_content};
use crate::error::CliError;

pub fn run_versions(config: &VaultConfig, command: VersionsCommands) -> Result<(), CliError> {
    match command {
        VersionsCommands::List { note, all, json } => match note {
            Some(note) => run_versions_list(config, &note, json),
            None => run_notes_list(config, all, json),
        },
        VersionsCommands::Show {
            note,
            version,
            format,
        } => run_versions_show(config, &note, version, format),
    }
}

fn run_versions_list(config: &VaultConfig, note_id: &str, as_json: bool) -> Result<(), CliError> {
    let store = open_store(config)?;
    let versions = store.list_versions(note_id)?;
    if versions.is_empty() {
        return Err(CliError::NoteNotFound(note_id.to_string()));
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
    } else {
        for line in format_version_lines(&versions) {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_notes_list(config: &VaultConfig, include_deleted: bool, as_json: bool) -> Result<(), CliError> {
    let store = open_store(config)?;
    let db = Database::open(config.index_path()?)?;
    let notes = SqliteNoteStateRepository::new(db.connection()).list_notes(include_deleted)?;

    let mut rows = Vec::with_capacity(notes.len());
    for note in notes {
        let latest = store.latest_version(&note.uuid)?.map(|v| v.version_number);
        rows.push((note, latest));
    }

    if as_json {
        let items = rows
            .iter()
            .map(|(note, latest)| serde_json::json!({ "note": note, "latest_version": latest }))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if rows.is_empty() {
        println!("No notes tracked yet. Run `notevault check` first.");
    } else {
        for line in format_tracked_lines(&rows) {
            println!("{line}");
        }
    }
    Ok(())
}

fn run_versions_show(
    config: &VaultConfig,
    note_id: &str,
    version: Option<u32>,
    format: ContentFormat,
) -> Result<(), CliError> {
    let store = open_store(config)?;
    let snapshot = load_snapshot(&store, note_id, version)?;
    println!("{}", render_content(&snapshot_content(&snapshot), format)?);
    Ok(())
}

/// A stored version, the latest one when `version` is `None`
pub fn load_snapshot(
    store: &VersionStore,
    note_id: &str,
    version: Option<u32>,
) -> Result<VersionSnapshot, CliError> {
    let record = match version {
        Some(number) => store
            .get_version(note_id, number)?
            .ok_or_else(|| CliError::VersionNotFound {
                note: note_id.to_string(),
                version: number,
            })?,
        None => store
            .latest_version(note_id)?
            .ok_or_else(|| CliError::NoteNotFound(note_id.to_string()))?,
    };
    Ok(store.load_version(&record.storage_path)?)
}

/// Stored renderings in the shape the content printer expects
pub fn snapshot_content(snapshot: &VersionSnapshot) -> DecodedContent {
    DecodedContent {
        plaintext: snapshot.plaintext.clone(),
        markdown: snapshot.markdown.clone(),
        html: snapshot.html.clone(),
        attribute_runs: Vec::new(),
        has_embedded_objects: snapshot.has_embedded_objects,
    }
}
