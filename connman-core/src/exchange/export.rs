//! Plaintext JSON export.

use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use tracing::{info, warn};

use super::record::ExportRecord;
use super::{Confirmation, ExportSummary};
use crate::crypto::write_private_file;
use crate::error::{ExchangeError, ExchangeResult, StoreError};
use crate::models::PasswordState;
use crate::store::ConnectionStore;

/// Writes every record to `path` as JSON with plaintext passwords
///
/// The file is created readable only by the owner, written to a temporary
/// sibling first and then renamed into place. A record whose password cannot
/// be decrypted is exported without it and reported in
/// [`ExportSummary::unreadable`].
///
/// # Errors
///
/// Returns `ExchangeError::ConfirmationRequired` unless `confirmation` is
/// [`Confirmation::Confirmed`], `ExchangeError::Io` if the file cannot be
/// written, and store errors if the key file is unusable.
pub fn export_all(
    store: &ConnectionStore,
    path: &Path,
    confirmation: Confirmation,
) -> ExchangeResult<ExportSummary> {
    if !confirmation.is_confirmed() {
        return Err(ExchangeError::ConfirmationRequired(format!(
            "export to {} writes passwords in plaintext",
            path.display()
        )));
    }

    let connections = store.list()?;
    let mut unreadable = Vec::new();
    let mut passwords = Vec::with_capacity(connections.len());

    for connection in &connections {
        let password = match &connection.password {
            PasswordState::None => None,
            _ => match store.decrypt_password(connection) {
                Ok(secret) => Some(secret.expose_secret().to_owned()),
                Err(StoreError::Crypto(e)) => {
                    warn!(alias = %connection.alias, error = %e, "Exporting without unreadable password");
                    unreadable.push(connection.alias.clone());
                    None
                }
                Err(e) => return Err(e.into()),
            },
        };
        passwords.push(password);
    }

    let records: Vec<ExportRecord<'_>> = connections
        .iter()
        .zip(passwords)
        .map(|(connection, password)| ExportRecord::new(connection, password))
        .collect();
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| ExchangeError::Serialize(e.to_string()))?;

    write_atomically(path, json.as_bytes())?;

    info!(path = %path.display(), count = records.len(), "Exported connections in plaintext");
    Ok(ExportSummary {
        path: path.to_path_buf(),
        count: records.len(),
        plaintext_warning: true,
        unreadable,
    })
}

fn write_atomically(path: &Path, data: &[u8]) -> ExchangeResult<()> {
    let io_error = |source| ExchangeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let name = path
        .file_name()
        .map_or_else(|| "export".into(), |n| n.to_string_lossy().into_owned());
    let tmp_path = path.with_file_name(format!(".{name}.{}.tmp", std::process::id()));

    if let Err(e) = write_private_file(&tmp_path, data) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error(e));
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        io_error(e)
    })
}
