//! JSON shapes of exported and imported records.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Connection, ConnectionDraft, ProtocolType, Resolution};

/// One record as written by an export
#[derive(Debug, Serialize)]
pub struct ExportRecord<'a> {
    pub id: i64,
    pub alias: &'a str,
    pub protocol: ProtocolType,
    pub host: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    pub tags: &'a BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: &'a BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> ExportRecord<'a> {
    /// Builds the export shape of `connection` with an optional plaintext password
    pub fn new(connection: &'a Connection, password: Option<String>) -> Self {
        Self {
            id: connection.id,
            alias: &connection.alias,
            protocol: connection.protocol,
            host: &connection.host,
            port: connection.port,
            username: connection.username.as_deref(),
            password,
            ssh_key_path: connection.ssh_key_path.as_ref(),
            domain: connection.domain.as_deref(),
            resolution: connection.resolution,
            tags: &connection.tags,
            notes: connection.notes.as_deref(),
            extras: &connection.extras,
            created_at: connection.created_at,
            updated_at: connection.updated_at,
        }
    }
}

/// Port given either as a JSON number or a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Text(String),
}

impl PortValue {
    fn to_port(&self) -> Result<Option<u16>, String> {
        let number = match self {
            Self::Number(n) => *n,
            Self::Text(s) if s.trim().is_empty() => return Ok(None),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("port '{s}' is not a number"))?,
        };
        match u16::try_from(number) {
            Ok(port) if port > 0 => Ok(Some(port)),
            _ => Err(format!("port {number} is not between 1 and 65535")),
        }
    }
}

/// One record as read by an import
///
/// Every field is optional here so that missing required fields are reported
/// per record instead of failing the whole document. `id` and timestamps
/// from exports are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ImportRecord {
    pub alias: Option<String>,
    pub protocol: Option<String>,
    #[serde(alias = "host_or_ip")]
    pub host: Option<String>,
    pub port: Option<PortValue>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssh_key_path: Option<PathBuf>,
    pub domain: Option<String>,
    pub resolution: Option<String>,
    pub tags: Option<Vec<String>>,
    pub tag: Option<String>,
    pub notes: Option<String>,
    pub extras: Option<BTreeMap<String, Value>>,
}

impl ImportRecord {
    /// Returns the alias for error reports, if present
    pub fn alias_hint(value: &Value) -> Option<String> {
        value
            .get("alias")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Checks required fields and converts into a draft
    ///
    /// Field-level rules such as alias format are left to the store.
    pub fn into_draft(self) -> Result<ConnectionDraft, String> {
        let alias = required(self.alias, "alias")?;
        let protocol = required(self.protocol, "protocol")?
            .parse::<ProtocolType>()
            .map_err(|e| e.to_string())?;
        let host = required(self.host, "host")?;

        let mut draft = ConnectionDraft::new(alias, protocol, host);
        if let Some(port) = self.port.as_ref().map(PortValue::to_port).transpose()? {
            draft.port = port;
        }
        draft.username = self.username;
        draft.password = self.password.filter(|p| !p.is_empty()).map(Into::into);
        draft.ssh_key_path = self.ssh_key_path.filter(|p| !p.as_os_str().is_empty());
        draft.domain = self.domain;
        draft.resolution = self
            .resolution
            .filter(|r| !r.trim().is_empty())
            .map(|r| r.parse::<Resolution>())
            .transpose()?;
        draft.notes = self.notes;

        let mut tags = self.tags.unwrap_or_default();
        tags.extend(self.tag);
        draft.tags = tags;

        draft.extras = self
            .extras
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, value)
            })
            .collect();
        Ok(draft)
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| format!("missing required field '{field}'"))
}
