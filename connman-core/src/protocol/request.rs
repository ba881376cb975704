//! Connect requests handed to the launcher.

use std::collections::BTreeMap;
use std::path::PathBuf;

use secrecy::SecretString;
use tracing::debug;

use crate::error::StoreResult;
use crate::models::{Connection, PasswordState, ProtocolType, Resolution};
use crate::store::ConnectionStore;

/// How the password reaches the client program
#[derive(Debug)]
pub enum PasswordHandoff {
    /// The stored password, decrypted for this launch only
    Provided(SecretString),
    /// Nothing is stored; the user must be asked interactively
    PromptInteractively,
}

impl PasswordHandoff {
    /// Returns the password if one was provided
    #[must_use]
    pub const fn provided(&self) -> Option<&SecretString> {
        match self {
            Self::Provided(secret) => Some(secret),
            Self::PromptInteractively => None,
        }
    }
}

/// Everything the launcher needs to start a client
#[derive(Debug)]
pub struct ConnectRequest {
    /// Alias of the connection
    pub alias: String,
    /// Protocol to use
    pub protocol: ProtocolType,
    /// Remote host (or URL for web protocols)
    pub host: String,
    /// Port, already defaulted
    pub port: u16,
    /// Whether the port was set explicitly on the record
    pub explicit_port: bool,
    /// Username for authentication
    pub username: Option<String>,
    /// Windows domain
    pub domain: Option<String>,
    /// SSH identity file
    pub ssh_key_path: Option<PathBuf>,
    /// RDP window size
    pub resolution: Option<Resolution>,
    /// Additional client options
    pub extras: BTreeMap<String, String>,
    /// Password handoff
    pub password: PasswordHandoff,
}

impl ConnectRequest {
    /// Builds a request from a record and a password decision
    #[must_use]
    pub fn from_connection(connection: Connection, password: PasswordHandoff) -> Self {
        Self {
            port: connection.effective_port(),
            explicit_port: connection.port.is_some(),
            alias: connection.alias,
            protocol: connection.protocol,
            host: connection.host,
            username: connection.username,
            domain: connection.domain,
            ssh_key_path: connection.ssh_key_path,
            resolution: connection.resolution,
            extras: connection.extras,
            password,
        }
    }

    /// Replaces the password handoff
    #[must_use]
    pub fn with_password(mut self, password: PasswordHandoff) -> Self {
        self.password = password;
        self
    }
}

/// Resolves `alias_or_id` and prepares it for launching
///
/// The stored password, if any, is decrypted here and nowhere else. A record
/// without a password yields [`PasswordHandoff::PromptInteractively`].
///
/// # Errors
///
/// Returns `StoreError::NotFound` if no record matches, and key or crypto
/// errors if a stored password cannot be decrypted.
pub fn prepare_connect(store: &ConnectionStore, alias_or_id: &str) -> StoreResult<ConnectRequest> {
    let connection = store.get(alias_or_id)?;
    let password = match connection.password {
        PasswordState::None => PasswordHandoff::PromptInteractively,
        _ => PasswordHandoff::Provided(store.decrypt_password(&connection)?),
    };
    debug!(
        alias = %connection.alias,
        protocol = %connection.protocol,
        prompt = matches!(password, PasswordHandoff::PromptInteractively),
        "Prepared connect request"
    );
    Ok(ConnectRequest::from_connection(connection, password))
}
