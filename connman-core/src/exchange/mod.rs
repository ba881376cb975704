//! JSON import and export
//!
//! The exchange format is a JSON array with one object per connection and
//! the password in plaintext, so files stay readable by other tools. Because
//! of that, [`export_all`] and overwrite-imports refuse to run unless the
//! caller passes [`Confirmation::Confirmed`]; the presentation layer is
//! expected to warn the user and ask first.

mod export;
mod import;
mod record;

use std::fmt;
use std::path::PathBuf;

pub use export::export_all;
pub use import::import_all;

use crate::error::ErrorKind;

/// Caller acknowledgment for plaintext or destructive operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    /// The user has not agreed to the risk
    #[default]
    Pending,
    /// The user agreed to the risk
    Confirmed,
}

impl Confirmation {
    /// Returns true if the operation may proceed
    #[must_use]
    pub const fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Pending
        }
    }
}

/// What to do when an imported alias already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Leave the existing record untouched
    #[default]
    Skip,
    /// Replace the existing record's fields, keeping its id
    Overwrite,
    /// Import under the first free `alias-N`
    Rename,
}

impl ConflictPolicy {
    /// Returns the policy name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Overwrite => "overwrite",
            Self::Rename => "rename",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// File written
    pub path: PathBuf,
    /// Number of records written
    pub count: usize,
    /// Always true: the file contains plaintext passwords
    pub plaintext_warning: bool,
    /// Aliases whose password could not be decrypted and was left out
    pub unreadable: Vec<String>,
}

impl ExportSummary {
    /// Returns a summary string of the export
    #[must_use]
    pub fn summary(&self) -> String {
        let mut text = format!("Exported: {}", self.count);
        if !self.unreadable.is_empty() {
            text.push_str(&format!(
                ", without unreadable password: {}",
                self.unreadable.join(", ")
            ));
        }
        text
    }
}

/// A record that failed to import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    /// Zero-based position in the JSON array
    pub index: usize,
    /// Alias of the record, when it has one
    pub alias: Option<String>,
    /// Error kind of the failure
    pub kind: ErrorKind,
    /// What was wrong
    pub reason: String,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "record {} ({alias}): {}", self.index, self.reason),
            None => write!(f, "record {}: {}", self.index, self.reason),
        }
    }
}

/// A record left out because its alias already exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Zero-based position in the JSON array
    pub index: usize,
    /// The conflicting alias
    pub alias: String,
}

/// A record imported under a different alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedRecord {
    /// Zero-based position in the JSON array
    pub index: usize,
    /// Alias in the file
    pub from: String,
    /// Alias in the store
    pub to: String,
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of records added or overwritten
    pub imported: usize,
    /// Records that replaced an existing one
    pub overwritten: Vec<String>,
    /// Records stored under a new alias
    pub renamed: Vec<RenamedRecord>,
    /// Records left out because of an alias conflict
    pub skipped: Vec<SkippedRecord>,
    /// Records that failed validation or encryption
    pub errors: Vec<RecordError>,
}

impl ImportReport {
    /// Returns the total number of entries processed
    #[must_use]
    pub fn total_processed(&self) -> usize {
        self.imported + self.skipped.len() + self.errors.len()
    }

    /// Returns true if any record failed
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns a summary string of the import
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Imported: {}, Overwritten: {}, Renamed: {}, Skipped: {}, Errors: {}",
            self.imported,
            self.overwritten.len(),
            self.renamed.len(),
            self.skipped.len(),
            self.errors.len()
        )
    }
}
