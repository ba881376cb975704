//! SSH protocol handler

use crate::error::{LaunchError, LaunchResult};
use crate::models::ProtocolType;

use super::{validate_common, ConnectRequest, LaunchCommand, PasswordHandoff, Protocol};

/// SSH protocol handler
///
/// Builds `ssh` command lines. A stored password is handed over through
/// `sshpass -e`, which reads it from the `SSHPASS` environment variable so it
/// never shows up in the process list.
pub struct SshProtocol;

impl SshProtocol {
    /// Creates a new SSH protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for SshProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for SshProtocol {
    fn protocol_type(&self) -> ProtocolType {
        ProtocolType::Ssh
    }

    fn display_name(&self) -> &'static str {
        "SSH"
    }

    fn validate(&self, request: &ConnectRequest) -> LaunchResult<()> {
        validate_common(ProtocolType::Ssh, request)?;

        if let Some(key_path) = &request.ssh_key_path {
            if !key_path.as_os_str().is_empty() && !key_path.exists() {
                return Err(LaunchError::InvalidConfig(format!(
                    "SSH key file not found: {}",
                    key_path.display()
                )));
            }
        }
        Ok(())
    }

    fn build_command(&self, request: &ConnectRequest) -> LaunchResult<LaunchCommand> {
        let mut command = match &request.password {
            PasswordHandoff::Provided(secret) => LaunchCommand::new("sshpass")
                .arg("-e")
                .arg("ssh")
                .env("SSHPASS", secret.clone()),
            PasswordHandoff::PromptInteractively => LaunchCommand::new("ssh"),
        };

        command = command.arg("-p").arg(request.port.to_string());

        if let Some(key_path) = &request.ssh_key_path {
            command = command
                .arg("-i")
                .arg(key_path.to_string_lossy().into_owned());
        }

        for (key, value) in &request.extras {
            command = command.arg("-o").arg(format!("{key}={value}"));
        }

        let target = match &request.username {
            Some(user) => format!("{user}@{}", request.host),
            None => request.host.clone(),
        };
        Ok(command.arg(target))
    }
}
