//! Persisted provider configuration.
//!
//! Stored as TOML at `$ARBOR_CONFIG`, or `~/.config/arbor/config.toml`.
//! A missing or corrupt file never blocks generation: `get_config` falls back
//! to defaults.

use crate::provider::ProviderConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "ARBOR_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    ConfigLoad(String),

    #[error("Config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// File-backed `get_config` / `set_config`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at [`default_path`](Self::default_path).
    pub fn open_default() -> Self {
        Self::new(Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("arbor")
            .join("config.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored config. `Ok(None)` when nothing is stored.
    ///
    /// Fields missing from the file take their defaults.
    pub fn load(&self) -> Result<Option<ProviderConfig>, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::ConfigLoad(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        toml::from_str(&content)
            .map(Some)
            .map_err(|e| ConfigError::ConfigLoad(format!("{}: {}", self.path.display(), e)))
    }

    /// Stored config, or defaults when absent or unreadable.
    pub fn get_config(&self) -> ProviderConfig {
        match self.load() {
            Ok(Some(config)) => config,
            Ok(None) => {
                debug!("No config at {}, using defaults", self.path.display());
                ProviderConfig::default()
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                ProviderConfig::default()
            }
        }
    }

    /// Persist `config` when `save_to_local` is set, otherwise clear any
    /// stored copy.
    pub fn set_config(&self, config: &ProviderConfig) -> Result<(), ConfigError> {
        if !config.save_to_local {
            return self.clear();
        }

        let content = toml::to_string_pretty(config)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, content)?;
        info!("Saved config to {}", self.path.display());
        Ok(())
    }

    /// Remove the stored config. A missing file is fine.
    pub fn clear(&self) -> Result<(), ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed config at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
