//! Persistent configuration
//!
//! A single JSON file, `config.json` under the platform config directory.
//! A missing file means defaults; empty strings are treated as unset.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::decoder::DecoderConfig;
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

const APP_DIR_NAME: &str = "notevault";
const CONFIG_FILE_NAME: &str = "config.json";
const INDEX_FILE_NAME: &str = "index.db";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Location of the note application's store on macOS, relative to home
const DEFAULT_SOURCE_PATH: &str =
    "Library/Group Containers/group.com.apple.notes/NoteStore.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Directory holding version files
    #[serde(default)]
    pub version_root: Option<PathBuf>,
    /// Index database path
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    /// The note application's store
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Keep at most this many versions per note
    #[serde(default)]
    pub retention: Option<usize>,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// Directory of mirrored markdown files
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
    /// Remote folder mirrored into `local_dir`
    #[serde(default)]
    pub remote_folder: Option<String>,
}

const fn default_config_version() -> u32 {
    1
}

const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            version_root: None,
            index_path: None,
            source_path: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            retention: None,
            decoder: DecoderConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

/// `<config dir>/notevault/config.json`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("could not resolve the config directory".to_string()))
}

fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| Error::Config("could not resolve the data directory".to_string()))
}

impl VaultConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!("failed to read config at {}: {error}", path.display()))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!("failed to parse config at {}: {error}", path.display()))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!(
                    "failed to create config directory {}: {error}",
                    parent.display()
                ))
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized).map_err(|error| {
            Error::Config(format!("failed to write config at {}: {error}", path.display()))
        })
    }

    /// Version root, defaulting to `<data dir>/notevault/versions`
    pub fn version_root(&self) -> Result<PathBuf> {
        match &self.version_root {
            Some(path) => Ok(path.clone()),
            None => Ok(default_data_dir()?.join("versions")),
        }
    }

    /// Index path, defaulting to `<data dir>/notevault/index.db`
    pub fn index_path(&self) -> Result<PathBuf> {
        match &self.index_path {
            Some(path) => Ok(path.clone()),
            None => Ok(default_data_dir()?.join(INDEX_FILE_NAME)),
        }
    }

    /// Note store path, defaulting to the application's usual location
    pub fn source_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.source_path {
            return Ok(path.clone());
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_SOURCE_PATH))
            .ok_or_else(|| Error::Config("could not resolve the home directory".to_string()))
    }

    /// Poll interval in seconds, never below one
    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs.max(1)
    }

    /// Sync directory and folder, falling back to command line values
    pub fn sync_target(
        &self,
        local_dir: Option<PathBuf>,
        remote_folder: Option<String>,
    ) -> Result<(PathBuf, String)> {
        let local_dir = local_dir
            .or_else(|| self.sync.local_dir.clone())
            .ok_or_else(|| Error::Config("no sync directory configured".to_string()))?;
        let remote_folder = normalize_text_option(remote_folder)
            .or_else(|| self.sync.remote_folder.clone())
            .ok_or_else(|| Error::Config("no remote folder configured".to_string()))?;
        Ok((local_dir, remote_folder))
    }

    fn normalize(&mut self) {
        self.version_root = normalize_path(self.version_root.take());
        self.index_path = normalize_path(self.index_path.take());
        self.source_path = normalize_path(self.source_path.take());
        self.sync.local_dir = normalize_path(self.sync.local_dir.take());
        self.sync.remote_folder = normalize_text_option(self.sync.remote_folder.take());
        if self.retention == Some(0) {
            self.retention = None;
        }
    }
}

fn normalize_path(value: Option<PathBuf>) -> Option<PathBuf> {
    value.filter(|path| !path.as_os_str().is_empty())
}
