//! Field validation and normalization for connection records.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{StoreError, StoreResult};
use crate::models::ProtocolType;

/// Validates and trims an alias
///
/// # Errors
///
/// Returns `StoreError::Validation` if the alias is empty, contains
/// whitespace, or could be read as an id (all digits, or a signed integer
/// such as `+2` or `-1`).
pub fn alias(raw: &str) -> StoreResult<String> {
    let alias = raw.trim();
    if alias.is_empty() {
        return Err(StoreError::validation("alias", "must not be empty"));
    }
    if alias.chars().any(char::is_whitespace) {
        return Err(StoreError::validation("alias", "must not contain whitespace"));
    }
    if is_id_key(alias) || alias.parse::<i64>().is_ok() {
        return Err(StoreError::validation(
            "alias",
            "must not consist only of digits (it would be read as an id)",
        ));
    }
    Ok(alias.to_string())
}

/// Returns true if `key` is written the way ids are: ASCII digits only
#[must_use]
pub fn is_id_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Validates and trims a host
///
/// # Errors
///
/// Returns `StoreError::Validation` if the host is empty.
pub fn host(raw: &str) -> StoreResult<String> {
    let host = raw.trim();
    if host.is_empty() {
        return Err(StoreError::validation("host", "must not be empty"));
    }
    Ok(host.to_string())
}

/// Validates a port
///
/// # Errors
///
/// Returns `StoreError::Validation` for port 0.
pub fn port(port: Option<u16>) -> StoreResult<Option<u16>> {
    match port {
        Some(0) => Err(StoreError::validation(
            "port",
            "must be between 1 and 65535",
        )),
        other => Ok(other),
    }
}

/// Trims, deduplicates and checks tags
///
/// Empty tags are dropped.
///
/// # Errors
///
/// Returns `StoreError::Validation` if a tag is a protocol name or contains
/// a comma.
pub fn tags(raw: Vec<String>) -> StoreResult<BTreeSet<String>> {
    let mut out = BTreeSet::new();
    for tag in raw {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if ProtocolType::is_protocol_name(tag) {
            return Err(StoreError::validation(
                "tags",
                format!("'{tag}' is a protocol name and cannot be used as a tag"),
            ));
        }
        if tag.contains(',') {
            return Err(StoreError::validation(
                "tags",
                format!("'{tag}' must not contain a comma"),
            ));
        }
        out.insert(tag.to_string());
    }
    Ok(out)
}

/// Checks client option keys
///
/// # Errors
///
/// Returns `StoreError::Validation` if a key is empty.
pub fn extras(raw: BTreeMap<String, String>) -> StoreResult<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        let key = key.trim();
        if key.is_empty() {
            return Err(StoreError::validation("extras", "option names must not be empty"));
        }
        out.insert(key.to_string(), value);
    }
    Ok(out)
}

/// Trims optional text, turning blank values into `None`
pub fn optional_text(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
