use std::path::Path;

use notevault_core::config::VaultConfig;
use notevault_core::export::{render_json_export, render_markdown_export};

use crate::cli::ExportFormat;
use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_export(
    config: &VaultConfig,
    note_id: &str,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let store = open_store(config)?;
    let mut versions = store.list_versions(note_id)?;
    if versions.is_empty() {
        return Err(CliError::NoteNotFound(note_id.to_string()));
    }
    versions.reverse();

    let snapshots = versions
        .iter()
        .map(|version| store.load_version(&version.storage_path))
        .collect::<Result<Vec<_>, _>>()?;

    let rendered = match format {
        ExportFormat::Json => render_json_export(&snapshots)?,
        ExportFormat::Markdown => render_markdown_export(&snapshots),
    };

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
