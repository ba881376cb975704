//! Application context built once at startup.

use tracing::debug;

use crate::config::ResolvedConfig;
use crate::crypto::KeyManager;
use crate::error::Result;
use crate::store::ConnectionStore;

/// Everything a command needs: the resolved configuration and the store
///
/// Constructed once per process and passed to every command handler.
#[derive(Debug)]
pub struct AppContext {
    config: ResolvedConfig,
    store: ConnectionStore,
}

impl AppContext {
    /// Opens the store described by `config`
    ///
    /// The key file is not touched until a password is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: ResolvedConfig) -> Result<Self> {
        let keys = KeyManager::new(&config.key_path);
        let store = ConnectionStore::open(&config.db_path, keys)?;
        debug!(
            db = %config.db_path.display(),
            key = %config.key_path.display(),
            "Application context ready"
        );
        Ok(Self { config, store })
    }

    /// Returns the resolved configuration
    #[must_use]
    pub const fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Returns the connection store
    #[must_use]
    pub const fn store(&self) -> &ConnectionStore {
        &self.store
    }

    /// Returns the connection store for mutation
    pub fn store_mut(&mut self) -> &mut ConnectionStore {
        &mut self.store
    }
}
