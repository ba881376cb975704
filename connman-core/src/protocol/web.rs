//! Handlers for protocols opened through a URL: VMware Remote Console and HTTP

use crate::error::LaunchResult;
use crate::models::ProtocolType;

use super::{url_opener, ConnectRequest, LaunchCommand, Protocol};

/// VMRC protocol handler
///
/// Opens a `vmrc://` URL with the platform opener. A host that already is a
/// `vmrc://` URL is used as is; otherwise the URL is built from user, host,
/// port and an optional `moid` extra.
pub struct VmrcProtocol;

impl VmrcProtocol {
    /// Creates a new VMRC protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn url(request: &ConnectRequest) -> String {
        if request.host.starts_with("vmrc://") {
            return request.host.clone();
        }
        let user = request
            .username
            .as_deref()
            .map(|u| format!("{u}@"))
            .unwrap_or_default();
        let mut url = format!("vmrc://{user}{}:{}/", request.host, request.port);
        if let Some(moid) = request.extras.get("moid") {
            url.push_str(&format!("?moid={moid}"));
        }
        url
    }
}

impl Default for VmrcProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for VmrcProtocol {
    fn protocol_type(&self) -> ProtocolType {
        ProtocolType::Vmrc
    }

    fn display_name(&self) -> &'static str {
        "VMware Remote Console"
    }

    fn build_command(&self, request: &ConnectRequest) -> LaunchResult<LaunchCommand> {
        Ok(LaunchCommand::new(url_opener()).arg(Self::url(request)))
    }
}

/// HTTP protocol handler
///
/// Opens the web interface in the default browser.
pub struct HttpProtocol;

impl HttpProtocol {
    /// Creates a new HTTP protocol handler
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn url(request: &ConnectRequest) -> String {
        if request.host.contains("://") {
            return request.host.clone();
        }
        match request.port {
            443 => format!("https://{}", request.host),
            80 => format!("http://{}", request.host),
            port => format!("http://{}:{port}", request.host),
        }
    }
}

impl Default for HttpProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl Protocol for HttpProtocol {
    fn protocol_type(&self) -> ProtocolType {
        ProtocolType::Http
    }

    fn display_name(&self) -> &'static str {
        "HTTP"
    }

    fn build_command(&self, request: &ConnectRequest) -> LaunchResult<LaunchCommand> {
        Ok(LaunchCommand::new(url_opener()).arg(Self::url(request)))
    }
}
