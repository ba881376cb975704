//! Connection model representing a saved remote access profile.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use super::protocol::{ProtocolType, Resolution};
use crate::crypto::SealedPassword;

/// Indicator shown instead of a stored password
pub const MASKED_PASSWORD: &str = "********";

/// Indicator shown when a stored password blob cannot be read
pub const UNREADABLE_PASSWORD: &str = "<unreadable>";

/// Password attached to a connection record
///
/// Records read from the store carry [`PasswordState::Sealed`]. Plaintext only
/// appears as [`PasswordState::Revealed`] after an explicit request.
#[derive(Debug, Clone, Default)]
pub enum PasswordState {
    /// No password stored
    #[default]
    None,
    /// Encrypted password as stored on disk
    Sealed(SealedPassword),
    /// A password is stored but its blob is malformed
    Unreadable,
    /// Decrypted password, only produced on request
    Revealed(SecretString),
}

impl PasswordState {
    /// Returns true if any password is stored
    #[must_use]
    pub const fn is_set(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the text to display in place of the password
    ///
    /// Revealed passwords are still masked here; callers that want the
    /// plaintext must expose it explicitly.
    #[must_use]
    pub const fn display_indicator(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Sealed(_) | Self::Revealed(_) => MASKED_PASSWORD,
            Self::Unreadable => UNREADABLE_PASSWORD,
        }
    }

    /// Returns the plaintext if it has been revealed
    #[must_use]
    pub const fn revealed(&self) -> Option<&SecretString> {
        match self {
            Self::Revealed(secret) => Some(secret),
            _ => None,
        }
    }
}

impl PartialEq for PasswordState {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) | (Self::Unreadable, Self::Unreadable) => true,
            (Self::Sealed(a), Self::Sealed(b)) => a == b,
            (Self::Revealed(a), Self::Revealed(b)) => a.expose_secret() == b.expose_secret(),
            _ => false,
        }
    }
}

impl Eq for PasswordState {}

/// A stored connection profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Store-assigned identifier, never reused
    pub id: i64,
    /// Unique human-chosen name
    pub alias: String,
    /// Protocol used to connect
    pub protocol: ProtocolType,
    /// Remote host address (hostname, IP or URL)
    pub host: String,
    /// Remote port; the protocol default applies when absent
    pub port: Option<u16>,
    /// Username for authentication
    pub username: Option<String>,
    /// Stored password
    pub password: PasswordState,
    /// SSH identity file
    pub ssh_key_path: Option<PathBuf>,
    /// Windows domain for RDP logins
    pub domain: Option<String>,
    /// RDP window size
    pub resolution: Option<Resolution>,
    /// Tags for organization and filtering
    pub tags: BTreeSet<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Additional client options
    pub extras: BTreeMap<String, String>,
    /// Timestamp when the record was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    /// Returns the configured port or the protocol default
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    /// Returns true if the record carries the tag
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns the tags joined with commas, for display
    #[must_use]
    pub fn tags_display(&self) -> String {
        self.tags.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }
}

/// Fields for a new connection record
#[derive(Debug)]
pub struct ConnectionDraft {
    /// Unique human-chosen name
    pub alias: String,
    /// Protocol used to connect
    pub protocol: ProtocolType,
    /// Remote host address
    pub host: String,
    /// Remote port
    pub port: Option<u16>,
    /// Username for authentication
    pub username: Option<String>,
    /// Plaintext password, encrypted by the store before persisting
    pub password: Option<SecretString>,
    /// SSH identity file
    pub ssh_key_path: Option<PathBuf>,
    /// Windows domain for RDP logins
    pub domain: Option<String>,
    /// RDP window size
    pub resolution: Option<Resolution>,
    /// Tags, normalized by the store
    pub tags: Vec<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Additional client options
    pub extras: BTreeMap<String, String>,
}

impl ConnectionDraft {
    /// Creates a draft with the required fields
    #[must_use]
    pub fn new(alias: impl Into<String>, protocol: ProtocolType, host: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            protocol,
            host: host.into(),
            port: None,
            username: None,
            password: None,
            ssh_key_path: None,
            domain: None,
            resolution: None,
            tags: Vec::new(),
            notes: None,
            extras: BTreeMap::new(),
        }
    }

    /// Sets the port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the username
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the plaintext password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Sets the SSH identity file
    #[must_use]
    pub fn with_ssh_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ssh_key_path = Some(path.into());
        self
    }

    /// Sets the Windows domain
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the RDP window size
    #[must_use]
    pub const fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Replaces the tags
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Adds a client option
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

/// Change to a single optional field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Leave the field as it is
    Keep,
    /// Replace the field
    Set(T),
    /// Remove the field
    Clear,
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> FieldUpdate<T> {
    /// Returns true if the field is left unchanged
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Applies the update to the current value
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Set(value) => Some(value),
            Self::Clear => None,
        }
    }

    /// Maps the carried value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldUpdate<U> {
        match self {
            Self::Keep => FieldUpdate::Keep,
            Self::Set(value) => FieldUpdate::Set(f(value)),
            Self::Clear => FieldUpdate::Clear,
        }
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Keep, Self::Set)
    }
}

/// Changes applied by an edit
///
/// Every mutable attribute has its own slot. Required fields use `Option`
/// (`None` keeps the current value); optional fields use [`FieldUpdate`] so
/// they can also be cleared.
#[derive(Debug, Default)]
pub struct ConnectionChanges {
    /// New alias
    pub alias: Option<String>,
    /// New protocol
    pub protocol: Option<ProtocolType>,
    /// New host
    pub host: Option<String>,
    /// Port change
    pub port: FieldUpdate<u16>,
    /// Username change
    pub username: FieldUpdate<String>,
    /// Password change; a new password is re-encrypted
    pub password: FieldUpdate<SecretString>,
    /// SSH identity file change
    pub ssh_key_path: FieldUpdate<PathBuf>,
    /// Domain change
    pub domain: FieldUpdate<String>,
    /// Resolution change
    pub resolution: FieldUpdate<Resolution>,
    /// Notes change
    pub notes: FieldUpdate<String>,
    /// Replacement tag list
    pub tags: Option<Vec<String>>,
    /// Replacement client options
    pub extras: Option<BTreeMap<String, String>>,
}

impl ConnectionChanges {
    /// Returns true if nothing would change
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.alias.is_none()
            && self.protocol.is_none()
            && self.host.is_none()
            && self.port.is_keep()
            && self.username.is_keep()
            && self.password.is_keep()
            && self.ssh_key_path.is_keep()
            && self.domain.is_keep()
            && self.resolution.is_keep()
            && self.notes.is_keep()
            && self.tags.is_none()
            && self.extras.is_none()
    }

    /// Sets a new alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets a new host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets a new password
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = FieldUpdate::Set(SecretString::from(password.into()));
        self
    }

    /// Replaces the tags
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

impl From<ConnectionDraft> for ConnectionChanges {
    /// Builds a change set that replaces every field with the draft's values
    fn from(draft: ConnectionDraft) -> Self {
        Self {
            alias: Some(draft.alias),
            protocol: Some(draft.protocol),
            host: Some(draft.host),
            port: replace_with(draft.port),
            username: replace_with(draft.username),
            password: replace_with(draft.password),
            ssh_key_path: replace_with(draft.ssh_key_path),
            domain: replace_with(draft.domain),
            resolution: replace_with(draft.resolution),
            notes: replace_with(draft.notes),
            tags: Some(draft.tags),
            extras: Some(draft.extras),
        }
    }
}

fn replace_with<T>(value: Option<T>) -> FieldUpdate<T> {
    value.map_or(FieldUpdate::Clear, FieldUpdate::Set)
}
