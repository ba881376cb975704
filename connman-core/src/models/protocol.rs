//! Protocol types and protocol-related value types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remote access protocol of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    /// SSH protocol
    Ssh,
    /// RDP protocol
    Rdp,
    /// VNC protocol
    Vnc,
    /// VMware Remote Console
    Vmrc,
    /// Web interface opened in a browser
    Http,
}

impl ProtocolType {
    /// Returns all supported protocols
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Ssh, Self::Rdp, Self::Vnc, Self::Vmrc, Self::Http]
    }

    /// Returns the protocol identifier as a lowercase string
    ///
    /// This is the form stored in the database and in JSON exports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Rdp => "rdp",
            Self::Vnc => "vnc",
            Self::Vmrc => "vmrc",
            Self::Http => "http",
        }
    }

    /// Returns the default port for this protocol type
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::Ssh => 22,
            Self::Rdp => 3389,
            Self::Vnc => 5900,
            Self::Vmrc => 902,
            Self::Http => 80,
        }
    }

    /// Returns true if `name` is a protocol identifier (case-insensitive)
    #[must_use]
    pub fn is_protocol_name(name: &str) -> bool {
        name.parse::<Self>().is_ok()
    }
}

impl fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ssh => write!(f, "SSH"),
            Self::Rdp => write!(f, "RDP"),
            Self::Vnc => write!(f, "VNC"),
            Self::Vmrc => write!(f, "VMRC"),
            Self::Http => write!(f, "HTTP"),
        }
    }
}

/// Error returned when a protocol name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown protocol '{0}', expected one of: ssh, rdp, vnc, vmrc, http")]
pub struct ParseProtocolError(pub String);

impl FromStr for ProtocolType {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ssh" => Ok(Self::Ssh),
            "rdp" => Ok(Self::Rdp),
            "vnc" => Ok(Self::Vnc),
            "vmrc" => Ok(Self::Vmrc),
            "http" => Ok(Self::Http),
            _ => Err(ParseProtocolError(s.to_string())),
        }
    }
}

/// Remote desktop window size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Resolution {
    /// Creates a new resolution
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("'{s}' is not WIDTHxHEIGHT");
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.parse().map_err(|_| invalid())?;
        let height: u32 = h.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(format!("'{s}' has a zero dimension"));
        }
        Ok(Self::new(width, height))
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}
