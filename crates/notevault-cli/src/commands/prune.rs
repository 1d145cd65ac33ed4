use notevault_core::config::VaultConfig;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_prune(
    config: &VaultConfig,
    note_id: Option<&str>,
    keep: Option<usize>,
) -> Result<(), CliError> {
    let keep = keep
        .or(config.retention)
        .ok_or(CliError::RetentionNotConfigured)?;
    let store = open_store(config)?;

    let note_ids = match note_id {
        Some(id) => vec![id.to_string()],
        None => store.note_ids()?,
    };

    let mut removed = 0;
    for id in &note_ids {
        removed += store.prune(id, keep)?;
    }

    println!(
        "Removed {removed} version(s) across {} note(s), keeping {keep} per note",
        note_ids.len()
    );
    Ok(())
}
