// Configuration loaded from YAML

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const APP_DIR: &str = "tasktracker";
const CONFIG_FILE: &str = "config.yml";

/// Which key-value backend holds the persisted state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory that will contain `.tasktracker/`
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// One of error, warn, info, debug, trace
    pub log_level: String,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read config {:?}", path))?;
        let config = Self::from_yaml(&content).with_context(|| format!("Failed to parse config {:?}", path))?;
        info!(?path, "Loaded config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::WARN)
    }
}

/// `<config_dir>/tasktracker/config.yml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// `<data_local_dir>/tasktracker`, falling back to the current directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}
