use std::path::Path;

use notevault_core::config::VaultConfig;
use notevault_core::NoteDecoder;

use crate::cli::ContentFormat;
use crate::commands::common::render_content;
use crate::error::CliError;

pub fn run_decode(config: &VaultConfig, file: &Path, format: ContentFormat) -> Result<(), CliError> {
    let payload = std::fs::read(file)?;
    let content = NoteDecoder::new(config.decoder).decode(&payload)?;

    tracing::debug!(
        "Decoded {} bytes into {} characters and {} attribute runs",
        payload.len(),
        content.character_count(),
        content.attribute_runs.len()
    );
    println!("{}", render_content(&content, format)?);
    Ok(())
}
