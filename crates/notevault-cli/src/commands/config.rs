use std::path::{Path, PathBuf};

use notevault_core::config::VaultConfig;
use notevault_core::util::normalize_text_option;
use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    config: VaultConfig,
    config_path: &Path,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            version_root,
            index_path,
            source_path,
            poll_interval,
            retention,
            sync_dir,
            sync_folder,
        } => {
            let updated = apply_config_init(
                config,
                ConfigInit {
                    version_root,
                    index_path,
                    source_path,
                    poll_interval,
                    retention,
                    sync_dir,
                    sync_folder,
                },
            )?;
            updated.save_to_path(config_path)?;
            println!("Saved config to {}", config_path.display());
            Ok(())
        }
        ConfigCommands::Show => run_config_show(&config, config_path),
    }
}

/// Values passed to `config init`; `None` keeps the current setting
#[derive(Debug, Default)]
pub struct ConfigInit {
    pub version_root: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub source_path: Option<PathBuf>,
    pub poll_interval: Option<u64>,
    pub retention: Option<usize>,
    pub sync_dir: Option<PathBuf>,
    pub sync_folder: Option<String>,
}

pub fn apply_config_init(mut config: VaultConfig, init: ConfigInit) -> Result<VaultConfig, CliError> {
    if init.poll_interval == Some(0) {
        return Err(CliError::Config(
            "poll interval must be at least one second".to_string(),
        ));
    }

    if let Some(path) = init.version_root {
        config.version_root = Some(path);
    }
    if let Some(path) = init.index_path {
        config.index_path = Some(path);
    }
    if let Some(path) = init.source_path {
        config.source_path = Some(path);
    }
    if let Some(secs) = init.poll_interval {
        config.poll_interval_secs = secs;
    }
    if let Some(keep) = init.retention {
        config.retention = (keep > 0).then_some(keep);
    }
    if let Some(path) = init.sync_dir {
        config.sync.local_dir = Some(path);
    }
    if let Some(folder) = normalize_text_option(init.sync_folder) {
        config.sync.remote_folder = Some(folder);
    }

    Ok(config)
}

#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    config_path: &'a Path,
    resolved_version_root: PathBuf,
    resolved_index_path: PathBuf,
    resolved_source_path: PathBuf,
    #[serde(flatten)]
    config: &'a VaultConfig,
}

fn run_config_show(config: &VaultConfig, config_path: &Path) -> Result<(), CliError> {
    let effective = EffectiveConfig {
        config_path,
        resolved_version_root: config.version_root()?,
        resolved_index_path: config.index_path()?,
        resolved_source_path: config.source_path()?,
        config,
    };
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(())
}
