//! notevault CLI - Versioned backups and plain-text sync for your notes
//!
//! Reads the note store directly, writes edits back through the notes
//! application's scripting interface.

mod automation;
mod cli;
mod commands;
mod error;
mod note_store;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::check::run_check;
use crate::commands::common::load_config;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::decode::run_decode;
use crate::commands::export::run_export;
use crate::commands::prune::run_prune;
use crate::commands::sync::run_sync;
use crate::commands::versions::run_versions;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "notevault=info"
        .parse()
        .map_err(|e| CliError::Config(format!("invalid log directive: {e}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let (config, config_path) = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { json } => run_check(&config, json)?,
        Commands::Watch { interval } => run_watch(&config, interval).await?,
        Commands::Decode { file, format } => run_decode(&config, &file, format)?,
        Commands::Versions { command } => run_versions(&config, command)?,
        Commands::Prune { note, keep } => run_prune(&config, note.as_deref(), keep)?,
        Commands::Sync { command } => {
            tokio::task::spawn_blocking(move || run_sync(&config, command))
                .await
                .map_err(|e| CliError::Task(e.to_string()))??;
        }
        Commands::Export {
            note,
            format,
            output,
        } => run_export(&config, &note, format, output.as_deref())?,
        Commands::Completions { .. } => {}
        Commands::Config { command } => run_config(command, config, &config_path)?,
    }

    Ok(())
}
