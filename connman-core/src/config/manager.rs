//! Configuration manager for TOML file operations
//!
//! This module provides the `ConfigManager` which loads and saves
//! `config.toml` and resolves the database and key locations from it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::settings::{ConnManConfig, ResolvedConfig};
use crate::error::{ConfigError, ConfigResult};

const APP_DIR: &str = "cm";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_FILE: &str = "cm.db";
const DEFAULT_KEY_FILE: &str = "cm.key";

/// Configuration manager for `ConnManager`
///
/// Configuration is stored in `~/.config/cm/config.toml` by default.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Base directory for configuration and default data files
    config_dir: PathBuf,
    /// The configuration file
    config_file: PathBuf,
}

impl ConfigManager {
    /// Creates a new `ConfigManager` with the default configuration directory
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be determined.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("~/.config")))?
            .join(APP_DIR);
        Ok(Self::with_config_dir(config_dir))
    }

    /// Creates a `ConfigManager` rooted at a custom directory
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join(CONFIG_FILE);
        Self {
            config_dir,
            config_file,
        }
    }

    /// Creates a `ConfigManager` for an explicit configuration file
    ///
    /// Relative paths inside the file resolve against its directory.
    #[must_use]
    pub fn with_config_file(config_file: PathBuf) -> Self {
        let config_dir = config_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Self {
            config_dir,
            config_file,
        }
    }

    /// Returns the configuration directory path
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the configuration file path
    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Loads the configuration file, or the defaults if there is none
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file exists but cannot be read and
    /// `ConfigError::Parse` if it is not valid TOML.
    pub fn load(&self) -> ConfigResult<ConnManConfig> {
        if !self.config_file.exists() {
            debug!(path = %self.config_file.display(), "No configuration file, using defaults");
            return Ok(ConnManConfig::default());
        }

        let content = fs::read_to_string(&self.config_file).map_err(|e| ConfigError::Read {
            path: self.config_file.clone(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::Parse(format!(
                "Failed to parse {}: {}",
                self.config_file.display(),
                e
            ))
        })
    }

    /// Saves the configuration file, creating its directory if needed
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Write` if serialization or writing fails.
    pub fn save(&self, config: &ConnManConfig) -> ConfigResult<()> {
        if let Some(parent) = self.config_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Write(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let content = toml::to_string_pretty(config)
            .map_err(|e| ConfigError::Write(format!("Failed to serialize: {e}")))?;
        fs::write(&self.config_file, content).map_err(|e| {
            ConfigError::Write(format!(
                "Failed to write {}: {}",
                self.config_file.display(),
                e
            ))
        })
    }

    /// Expands and defaults the paths of `config`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if a path references an unset variable.
    pub fn resolve(&self, config: &ConnManConfig) -> ConfigResult<ResolvedConfig> {
        let db_path = self.resolve_path(config.db_path.as_deref(), DEFAULT_DB_FILE)?;
        let key_path = self.resolve_path(config.key_path.as_deref(), DEFAULT_KEY_FILE)?;
        Ok(ResolvedConfig {
            db_path,
            key_path,
            log_level: config.log_level.clone(),
        })
    }

    /// Loads and resolves the configuration in one step
    ///
    /// # Errors
    ///
    /// See [`ConfigManager::load`] and [`ConfigManager::resolve`].
    pub fn load_resolved(&self) -> ConfigResult<ResolvedConfig> {
        self.resolve(&self.load()?)
    }

    fn resolve_path(&self, configured: Option<&str>, default_name: &str) -> ConfigResult<PathBuf> {
        let Some(raw) = configured.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(self.config_dir.join(default_name));
        };
        let expanded = shellexpand::full(raw)
            .map_err(|e| ConfigError::Parse(format!("Cannot expand path '{raw}': {e}")))?;
        let path = PathBuf::from(expanded.as_ref());
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.config_dir.join(path))
        }
    }
}
