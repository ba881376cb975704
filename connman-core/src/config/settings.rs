//! Settings stored in config.toml.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Contents of `config.toml`
///
/// Paths may start with `~` or reference environment variables; relative
/// paths are taken relative to the configuration directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnManConfig {
    /// Database file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    /// Encryption key file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    /// Default log filter when neither `--debug` nor `RUST_LOG` is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Configuration with every path expanded and defaulted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Database file location
    pub db_path: PathBuf,
    /// Encryption key file location
    pub key_path: PathBuf,
    /// Default log filter
    pub log_level: Option<String>,
}

impl ResolvedConfig {
    /// Replaces the database path
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Replaces the key path
    #[must_use]
    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = path.into();
        self
    }
}
