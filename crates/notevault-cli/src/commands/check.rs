use notevault_core::config::VaultConfig;

use crate::commands::common::{format_summary, open_monitor, open_store};
use crate::error::CliError;

pub fn run_check(config: &VaultConfig, as_json: bool) -> Result<(), CliError> {
    let store = open_store(config)?;
    let monitor = open_monitor(config, store)?;
    let summary = monitor.check_once()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", format_summary(&summary));
    }

    Ok(())
}
