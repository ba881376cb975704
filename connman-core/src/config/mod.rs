//! Configuration management for `ConnManager`
//!
//! The configuration file is optional. It only overrides where the database
//! and the encryption key live, and the default log level.

mod manager;
pub mod settings;

pub use manager::ConfigManager;
pub use settings::{ConnManConfig, ResolvedConfig};
