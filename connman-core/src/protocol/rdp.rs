//! RDP protocol handler

use crate::error::LaunchResult;
use crate::models::ProtocolType;

use super::{validate_common, ConnectRequest, LaunchCommand, PasswordHandoff, Protocol};

/// Domain sent when a user is given without one
const DEFAULT_DOMAIN: &str = "WORKGROUP";

/// RDP protocol handler
///
/// Implements the Protocol trait for RDP connections, building `FreeRDP`
/// (xfreerdp) commands with support for domain, resolution and extra
/// `/option:value` switches.
pub struct RdpProtocol;

impl RdpProtocol {
    /// Creates a new RDP protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Formats `host:port` for `/v:`, bracketing IPv6 literals
    fn server_address(host: &str, port: u16) -> String {
        if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        }
    }
}

impl Default for RdpProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for RdpProtocol {
    fn protocol_type(&self) -> ProtocolType {
        ProtocolType::Rdp
    }

    fn display_name(&self) -> &'static str {
        "RDP"
    }

    fn client_prompts_for_password(&self) -> bool {
        false
    }

    fn validate(&self, request: &ConnectRequest) -> LaunchResult<()> {
        validate_common(ProtocolType::Rdp, request)
    }

    fn build_command(&self, request: &ConnectRequest) -> LaunchResult<LaunchCommand> {
        let mut command = LaunchCommand::new("xfreerdp").arg(format!(
            "/v:{}",
            Self::server_address(&request.host, request.port)
        ));

        if let Some(user) = &request.username {
            let domain = request.domain.as_deref().unwrap_or(DEFAULT_DOMAIN);
            command = command.arg(format!("/u:{user}")).arg(format!("/d:{domain}"));
        } else if let Some(domain) = &request.domain {
            command = command.arg(format!("/d:{domain}"));
        }

        if let PasswordHandoff::Provided(secret) = &request.password {
            command = command.secret_arg("/p:", secret.clone());
        }

        if let Some(resolution) = request.resolution {
            command = command.arg(format!("/size:{resolution}"));
        }

        for (key, value) in &request.extras {
            command = if value.is_empty() {
                command.arg(format!("/{key}"))
            } else {
                command.arg(format!("/{key}:{value}"))
            };
        }

        Ok(command.arg("/cert:ignore"))
    }
}
