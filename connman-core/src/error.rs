//! Error types for `ConnManager`
//!
//! This module defines all error types used throughout the connection manager,
//! grouped by area: key management, password encryption, the connection store,
//! JSON import/export, configuration and client launching. Search query
//! errors live with the search module.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for `ConnManager` operations
#[derive(Debug, Error)]
pub enum ConnManError {
    /// Connection store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Encryption key errors
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    /// Password encryption errors
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Import/export errors
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Client launch errors
    #[error("Launch error: {0}")]
    Launch(#[from] LaunchError),

    /// Search query errors
    #[error("Search error: {0}")]
    Search(#[from] crate::search::SearchError),
}

impl ConnManError {
    /// Returns the user-facing error kind
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(e) => e.kind(),
            Self::Key(e) => e.kind(),
            Self::Crypto(e) => e.kind(),
            Self::Exchange(e) => e.kind(),
            Self::Search(_) => ErrorKind::Validation,
            Self::Config(_) | Self::Launch(_) => ErrorKind::Io,
        }
    }
}

/// Coarse classification of every failure the core can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Another live record already uses the alias
    DuplicateAlias,
    /// No record matches the given alias or id
    NotFound,
    /// The key file cannot be read or written
    KeyAccess,
    /// The key file exists but does not hold a valid key
    KeyCorrupt,
    /// A password blob failed authentication or is malformed
    Decryption,
    /// A record failed field validation
    Validation,
    /// The caller must confirm a destructive or plaintext operation
    ConfirmationRequired,
    /// File or database I/O failure
    Io,
}

/// Errors related to the encryption key file
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key file cannot be read, created or written
    #[error("Cannot access key file {path}: {reason}")]
    Access {
        /// Path of the key file
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The key file exists but is not a valid key
    #[error("Key file {path} is corrupt: {reason}")]
    Corrupt {
        /// Path of the key file
        path: PathBuf,
        /// What is wrong with the contents
        reason: String,
    },

    /// The system random number generator failed
    #[error("Random number generation failed")]
    Rng,
}

impl KeyError {
    /// Returns the user-facing error kind
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Access { .. } | Self::Rng => ErrorKind::KeyAccess,
            Self::Corrupt { .. } => ErrorKind::KeyCorrupt,
        }
    }
}

/// Errors related to password encryption and decryption
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The blob is malformed or failed its integrity check
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Sealing the plaintext failed
    #[error("Encryption failed: {0}")]
    Encryption(String),
}

impl CryptoError {
    /// Returns the user-facing error kind
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Decryption
    }
}

/// Errors related to the connection store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Alias already used by another record
    #[error("Alias '{0}' already exists")]
    DuplicateAlias(String),

    /// No record with the given alias or id
    #[error("Connection '{0}' not found")]
    NotFound(String),

    /// Invalid field value
    #[error("Invalid value for {field}: {reason}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// The reason for validation failure
        reason: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),

    /// Key file problem while touching a password
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Password encryption or decryption failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl StoreError {
    /// Shorthand for a validation failure
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the user-facing error kind
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateAlias(_) => ErrorKind::DuplicateAlias,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Database(_) => ErrorKind::Io,
            Self::Key(e) => e.kind(),
            Self::Crypto(e) => e.kind(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Errors related to JSON import and export
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Reading or writing the JSON file failed
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file being read or written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The document is not a JSON array of records
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// The file being imported
        path: PathBuf,
        /// The reason for parse failure
        reason: String,
    },

    /// Serializing the export failed
    #[error("Failed to serialize export: {0}")]
    Serialize(String),

    /// The operation writes plaintext secrets or overwrites records
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    /// Store failure that aborts the whole operation
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ExchangeError {
    /// Returns the user-facing error kind
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::Serialize(_) => ErrorKind::Io,
            Self::Parse { .. } => ErrorKind::Validation,
            Self::ConfirmationRequired(_) => ErrorKind::ConfirmationRequired,
            Self::Store(e) => e.kind(),
        }
    }
}

/// Errors related to configuration file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read configuration {path}: {reason}")]
    Read {
        /// The configuration file
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// Failed to parse configuration file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration directory could not be determined
    #[error("Configuration directory not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write configuration file
    #[error("Failed to write configuration: {0}")]
    Write(String),
}

/// Errors related to launching external client programs
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Required client binary not found
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Connection settings cannot be turned into a client command
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Spawning the client failed
    #[error("Failed to start {program}: {reason}")]
    SpawnFailed {
        /// The program that failed to start
        program: String,
        /// Underlying failure
        reason: String,
    },
}

/// Result type alias for `ConnManager` operations
pub type Result<T> = std::result::Result<T, ConnManError>;

/// Result type alias for key operations
pub type KeyResult<T> = std::result::Result<T, KeyError>;

/// Result type alias for crypto operations
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for import/export operations
pub type ExchangeResult<T> = std::result::Result<T, ExchangeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for launch operations
pub type LaunchResult<T> = std::result::Result<T, LaunchError>;
