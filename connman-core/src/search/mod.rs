//! Query and filter engine for connections
//!
//! Read-only filtering over the store's listing. Every function returns
//! records in ascending id order and never touches passwords.
//!
//! Free-text search is a case-insensitive substring match against alias,
//! host, username, notes and tags. [`SearchQuery::parse`] additionally
//! understands `protocol:<name>` and `tag:<name>` operators and quoted
//! phrases; all parts of a query must match.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::error::StoreResult;
use crate::models::{Connection, ProtocolType};
use crate::store::ConnectionStore;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]*)"|(\S+)"#).expect("Token pattern regex is valid")
});

static OPERATOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(protocol|proto|tag):(.*)$").expect("Operator pattern regex is valid")
});

/// Error type for search query parsing
#[derive(Debug, Error)]
pub enum SearchError {
    /// Invalid operator value in a search query
    #[error("Invalid operator '{operator}': {reason}")]
    InvalidOperator {
        /// The operator that was invalid
        operator: String,
        /// The reason it was invalid
        reason: String,
    },
}

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// A single condition a connection must satisfy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionFilter {
    /// Exact protocol match
    Protocol(ProtocolType),
    /// Exact tag match
    Tag(String),
    /// Case-insensitive substring match on the searchable fields
    Text(String),
    /// A protocol name filters by protocol, anything else by tag
    ProtocolOrTag(String),
}

impl ConnectionFilter {
    /// Returns true if `connection` satisfies the filter
    #[must_use]
    pub fn matches(&self, connection: &Connection) -> bool {
        match self {
            Self::Protocol(protocol) => connection.protocol == *protocol,
            Self::Tag(tag) => connection.has_tag(tag),
            Self::Text(text) => matches_text(connection, &text.to_lowercase()),
            Self::ProtocolOrTag(value) => match value.parse::<ProtocolType>() {
                Ok(protocol) => connection.protocol == protocol,
                Err(_) => connection.has_tag(value.trim()),
            },
        }
    }
}

/// Case-insensitive substring match; `needle` must already be lowercase
fn matches_text(connection: &Connection, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contains = |field: &str| field.to_lowercase().contains(needle);

    contains(&connection.alias)
        || contains(&connection.host)
        || connection.username.as_deref().is_some_and(contains)
        || connection.notes.as_deref().is_some_and(contains)
        || connection.tags.iter().any(|t| contains(t))
}

/// A parsed search query with text and filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Plain text search terms
    pub text: String,
    /// Filters extracted from operators
    pub filters: Vec<ConnectionFilter>,
}

impl SearchQuery {
    /// Creates a search query with just text
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filters: Vec::new(),
        }
    }

    /// Adds a filter to the query
    #[must_use]
    pub fn with_filter(mut self, filter: ConnectionFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Returns true if the query has no text and no filters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.filters.is_empty()
    }

    /// Parses a query string with optional operators
    ///
    /// Supported operators:
    /// - `protocol:<name>` (or `proto:`) - filter by protocol
    /// - `tag:<name>` - filter by exact tag
    ///
    /// Remaining words, and quoted phrases, form the free-text part.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidOperator` for an unknown protocol or an
    /// empty operator value.
    pub fn parse(input: &str) -> SearchResult<Self> {
        let mut query = Self::default();
        let mut text_parts = Vec::new();

        for caps in TOKEN_PATTERN.captures_iter(input) {
            if let Some(phrase) = caps.get(1) {
                text_parts.push(phrase.as_str());
                continue;
            }
            let Some(word) = caps.get(2).map(|m| m.as_str()) else {
                continue;
            };
            let Some(op) = OPERATOR_PATTERN.captures(word) else {
                text_parts.push(word);
                continue;
            };

            let operator = op[1].to_lowercase();
            let value = op.get(2).map_or("", |m| m.as_str());
            if value.is_empty() {
                return Err(SearchError::InvalidOperator {
                    operator,
                    reason: "value cannot be empty".to_string(),
                });
            }
            if operator == "tag" {
                query.filters.push(ConnectionFilter::Tag(value.to_string()));
            } else {
                let protocol =
                    value
                        .parse::<ProtocolType>()
                        .map_err(|e| SearchError::InvalidOperator {
                            operator: operator.clone(),
                            reason: e.to_string(),
                        })?;
                query.filters.push(ConnectionFilter::Protocol(protocol));
            }
        }

        query.text = text_parts.join(" ");
        Ok(query)
    }

    /// Returns true if `connection` satisfies every part of the query
    #[must_use]
    pub fn matches(&self, connection: &Connection) -> bool {
        self.filters.iter().all(|f| f.matches(connection))
            && matches_text(connection, &self.text.trim().to_lowercase())
    }

    /// Runs the query against the store
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` on query failure.
    pub fn run(&self, store: &ConnectionStore) -> StoreResult<Vec<Connection>> {
        let results: Vec<_> = store
            .list()?
            .into_iter()
            .filter(|c| self.matches(c))
            .collect();
        debug!(query = ?self, matches = results.len(), "Search completed");
        Ok(results)
    }
}

/// Returns the connections using `protocol`
///
/// # Errors
///
/// Returns `StoreError::Database` on query failure.
pub fn filter_by_protocol(
    store: &ConnectionStore,
    protocol: ProtocolType,
) -> StoreResult<Vec<Connection>> {
    store.list_filtered(&ConnectionFilter::Protocol(protocol))
}

/// Returns the connections carrying exactly `tag`
///
/// # Errors
///
/// Returns `StoreError::Database` on query failure.
pub fn filter_by_tag(store: &ConnectionStore, tag: &str) -> StoreResult<Vec<Connection>> {
    store.list_filtered(&ConnectionFilter::Tag(tag.to_string()))
}

/// Returns the connections whose alias, host, username, notes or tags contain
/// `text`, ignoring case
///
/// Empty text returns the full listing.
///
/// # Errors
///
/// Returns `StoreError::Database` on query failure.
pub fn search(store: &ConnectionStore, text: &str) -> StoreResult<Vec<Connection>> {
    store.list_filtered(&ConnectionFilter::Text(text.to_string()))
}
