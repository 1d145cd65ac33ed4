use notevault_core::config::VaultConfig;
use notevault_core::SyncOptions;

use crate::cli::{SyncCommands, SyncTargetArgs};
use crate::commands::common::{
    format_plan_lines, format_report, format_status_lines, open_sync_engine, plan_has_conflicts,
};
use crate::error::CliError;

pub fn run_sync(config: &VaultConfig, command: SyncCommands) -> Result<(), CliError> {
    match command {
        SyncCommands::Run {
            target,
            force_local,
            force_remote,
        } => run_sync_run(
            config,
            target,
            SyncOptions {
                force_local,
                force_remote,
            },
        ),
        SyncCommands::Plan {
            target,
            force_local,
            force_remote,
            json,
        } => run_sync_plan(
            config,
            target,
            SyncOptions {
                force_local,
                force_remote,
            },
            json,
        ),
        SyncCommands::Status { json } => run_sync_status(config, json),
    }
}

fn run_sync_run(
    config: &VaultConfig,
    target: SyncTargetArgs,
    options: SyncOptions,
) -> Result<(), CliError> {
    let (local_dir, remote_folder) = config.sync_target(target.dir, target.folder)?;
    let engine = open_sync_engine(config, options)?;

    let report = engine.sync(&local_dir, &remote_folder)?;
    println!("{}", format_report(&report));
    for failure in &report.failures {
        eprintln!(
            "  {} {}: {}",
            failure.action.kind, failure.action.local_path, failure.error
        );
    }

    if report.failed() > 0 {
        return Err(CliError::SyncFailures(report.failed()));
    }
    if report.conflicts > 0 {
        println!("Resolve conflicts with --force-local or --force-remote.");
    }
    Ok(())
}

fn run_sync_plan(
    config: &VaultConfig,
    target: SyncTargetArgs,
    options: SyncOptions,
    as_json: bool,
) -> Result<(), CliError> {
    let (local_dir, remote_folder) = config.sync_target(target.dir, target.folder)?;
    let engine = open_sync_engine(config, options)?;
    let plan = engine.plan(&local_dir, &remote_folder)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if plan.is_empty() {
        println!("Everything is in sync.");
        return Ok(());
    }

    for line in format_plan_lines(&plan) {
        println!("{line}");
    }
    if plan_has_conflicts(&plan) {
        println!("Conflicts need --force-local or --force-remote to resolve.");
    }
    Ok(())
}

fn run_sync_status(config: &VaultConfig, as_json: bool) -> Result<(), CliError> {
    let engine = open_sync_engine(config, SyncOptions::default())?;
    let records = engine.status()?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No files tracked yet.");
    } else {
        for line in format_status_lines(&records) {
            println!("{line}");
        }
    }
    Ok(())
}
