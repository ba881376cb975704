//! Launcher layer for `ConnManager`
//!
//! This module turns a stored connection into the command line of an
//! external client program. It provides the Protocol trait with one handler
//! per protocol, the [`ConnectRequest`] produced from the store at the moment
//! of connecting, and client detection helpers.
//!
//! No protocol is implemented here: every session is delegated to `ssh`,
//! `xfreerdp`, `vncviewer` or the platform URL opener, and the core never
//! waits for the spawned process.

mod command;
mod detection;
mod rdp;
mod registry;
mod request;
mod ssh;
mod vnc;
mod web;

pub use command::{LaunchArg, LaunchCommand};
pub use detection::{detect_client, ClientInfo};
pub use rdp::RdpProtocol;
pub use registry::ProtocolRegistry;
pub use request::{prepare_connect, ConnectRequest, PasswordHandoff};
pub use ssh::SshProtocol;
pub use vnc::VncProtocol;
pub use web::{HttpProtocol, VmrcProtocol};

use crate::error::{LaunchError, LaunchResult};
use crate::models::ProtocolType;

/// Core trait for all connection protocols
///
/// This trait defines the interface that all protocol handlers must implement.
/// It provides protocol metadata, validation and command construction.
pub trait Protocol: Send + Sync {
    /// Returns the protocol type handled
    fn protocol_type(&self) -> ProtocolType;

    /// Returns the protocol identifier (e.g., "ssh", "rdp", "vnc")
    fn protocol_id(&self) -> &'static str {
        self.protocol_type().as_str()
    }

    /// Returns human-readable protocol name
    fn display_name(&self) -> &'static str;

    /// Returns default port for this protocol
    fn default_port(&self) -> u16 {
        self.protocol_type().default_port()
    }

    /// Returns true if the client program asks for a missing password itself
    fn client_prompts_for_password(&self) -> bool {
        true
    }

    /// Validates the request for this protocol
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::InvalidConfig` describing the validation failure
    fn validate(&self, request: &ConnectRequest) -> LaunchResult<()> {
        validate_common(self.protocol_type(), request)
    }

    /// Builds the client command line for the request
    ///
    /// # Errors
    ///
    /// Returns `LaunchError::InvalidConfig` if the request is invalid
    fn build_command(&self, request: &ConnectRequest) -> LaunchResult<LaunchCommand>;
}

/// Checks what every protocol needs: a matching protocol and a host
fn validate_common(expected: ProtocolType, request: &ConnectRequest) -> LaunchResult<()> {
    if request.protocol != expected {
        return Err(LaunchError::InvalidConfig(format!(
            "Connection '{}' is not an {expected} connection",
            request.alias
        )));
    }
    if request.host.trim().is_empty() {
        return Err(LaunchError::InvalidConfig("Host cannot be empty".to_string()));
    }
    if request.port == 0 {
        return Err(LaunchError::InvalidConfig("Port cannot be 0".to_string()));
    }
    Ok(())
}

/// Returns the program that opens URLs on this platform
#[must_use]
pub const fn url_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Builds the launch command for `request` with the matching handler
///
/// # Errors
///
/// Returns `LaunchError::InvalidConfig` if the request fails validation.
pub fn build_launch_command(request: &ConnectRequest) -> LaunchResult<LaunchCommand> {
    let registry = ProtocolRegistry::new();
    let handler = registry.get_by_type(request.protocol);
    handler.validate(request)?;
    handler.build_command(request)
}
