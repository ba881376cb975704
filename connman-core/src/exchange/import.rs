//! JSON import with per-record error isolation.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::record::ImportRecord;
use super::{
    Confirmation, ConflictPolicy, ImportReport, RecordError, RenamedRecord, SkippedRecord,
};
use crate::error::{ErrorKind, ExchangeError, ExchangeResult, StoreError};
use crate::models::{ConnectionChanges, ConnectionDraft};
use crate::store::{validation, ConnectionStore};

/// Imports every record of the JSON array at `path`
///
/// Records are processed in order. A record that is malformed or fails
/// validation is reported in [`ImportReport::errors`] and the rest of the
/// batch continues. Passwords are sealed before they are stored.
///
/// # Errors
///
/// Returns `ExchangeError::ConfirmationRequired` for
/// [`ConflictPolicy::Overwrite`] without [`Confirmation::Confirmed`],
/// `ExchangeError::Io` if the file cannot be read, `ExchangeError::Parse` if
/// it is not a JSON array, and store errors that would fail every record
/// (database or key file failures).
pub fn import_all(
    store: &mut ConnectionStore,
    path: &Path,
    on_conflict: ConflictPolicy,
    confirmation: Confirmation,
) -> ExchangeResult<ImportReport> {
    if on_conflict == ConflictPolicy::Overwrite && !confirmation.is_confirmed() {
        return Err(ExchangeError::ConfirmationRequired(
            "overwriting existing connections".to_string(),
        ));
    }

    let content = fs::read_to_string(path).map_err(|source| ExchangeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|e| ExchangeError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let Value::Array(entries) = document else {
        return Err(ExchangeError::Parse {
            path: path.to_path_buf(),
            reason: "expected a JSON array of connections".to_string(),
        });
    };

    let mut report = ImportReport::default();
    for (index, entry) in entries.into_iter().enumerate() {
        let alias_hint = ImportRecord::alias_hint(&entry);
        let draft = serde_json::from_value::<ImportRecord>(entry)
            .map_err(|e| e.to_string())
            .and_then(ImportRecord::into_draft);
        let draft = match draft {
            Ok(draft) => draft,
            Err(reason) => {
                debug!(index, reason = %reason, "Rejected import record");
                report.errors.push(RecordError {
                    index,
                    alias: alias_hint,
                    kind: ErrorKind::Validation,
                    reason,
                });
                continue;
            }
        };

        if let Err(e) = import_one(store, index, draft, on_conflict, &mut report) {
            match e {
                StoreError::Database(_) | StoreError::Key(_) => return Err(e.into()),
                other => {
                    warn!(index, error = %other, "Failed to import record");
                    report.errors.push(RecordError {
                        index,
                        alias: alias_hint,
                        kind: other.kind(),
                        reason: other.to_string(),
                    });
                }
            }
        }
    }

    info!(
        path = %path.display(),
        policy = %on_conflict,
        imported = report.imported,
        skipped = report.skipped.len(),
        errors = report.errors.len(),
        "Import finished"
    );
    Ok(report)
}

fn import_one(
    store: &mut ConnectionStore,
    index: usize,
    mut draft: ConnectionDraft,
    on_conflict: ConflictPolicy,
    report: &mut ImportReport,
) -> Result<(), StoreError> {
    let alias = validation::alias(&draft.alias)?;
    if !store.alias_exists(&alias)? {
        store.add(draft)?;
        report.imported += 1;
        return Ok(());
    }

    match on_conflict {
        ConflictPolicy::Skip => {
            debug!(index, alias = %alias, "Skipped existing alias");
            report.skipped.push(SkippedRecord { index, alias });
        }
        ConflictPolicy::Overwrite => {
            store.update_by_alias(&alias, ConnectionChanges::from(draft))?;
            report.imported += 1;
            report.overwritten.push(alias);
        }
        ConflictPolicy::Rename => {
            let renamed = free_alias(store, &alias)?;
            draft.alias.clone_from(&renamed);
            store.add(draft)?;
            report.imported += 1;
            report.renamed.push(RenamedRecord {
                index,
                from: alias,
                to: renamed,
            });
        }
    }
    Ok(())
}

/// Returns the first `alias-N` (N >= 2) not used by any record
fn free_alias(store: &ConnectionStore, alias: &str) -> Result<String, StoreError> {
    let mut n = 2u32;
    loop {
        let candidate = format!("{alias}-{n}");
        if !store.alias_exists(&candidate)? {
            return Ok(candidate);
        }
        n += 1;
    }
}
