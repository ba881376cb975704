//! VNC protocol handler

use crate::error::LaunchResult;
use crate::models::ProtocolType;

use super::{ConnectRequest, LaunchCommand, Protocol};

/// VNC protocol handler
///
/// Builds `vncviewer host::port` command lines. The viewer asks for the
/// password itself, so a stored password is not passed on the command line.
pub struct VncProtocol;

impl VncProtocol {
    /// Creates a new VNC protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for VncProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for VncProtocol {
    fn protocol_type(&self) -> ProtocolType {
        ProtocolType::Vnc
    }

    fn display_name(&self) -> &'static str {
        "VNC"
    }

    fn build_command(&self, request: &ConnectRequest) -> LaunchResult<LaunchCommand> {
        let mut command = LaunchCommand::new("vncviewer");
        for (key, value) in &request.extras {
            command = command.arg(format!("-{key}={value}"));
        }
        Ok(command.arg(format!("{}::{}", request.host, request.port)))
    }
}
