//! Connection store
//!
//! The store is the system of record: a single SQLite table of connection
//! records. Passwords are sealed with the key from [`KeyManager`] before they
//! reach the database, and the key is only loaded when an operation actually
//! touches a password, so listing and searching keep working when the key
//! file is missing or damaged.

pub mod schema;
pub mod validation;

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::crypto::{self, EncryptionKey, KeyManager, SealedPassword};
use crate::error::{CryptoError, StoreError, StoreResult};
use crate::models::{
    Connection, ConnectionChanges, ConnectionDraft, FieldUpdate, PasswordState, ProtocolType,
    Resolution,
};
use crate::search::ConnectionFilter;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "SELECT id, alias, protocol, host, port, username, password, \
     ssh_key_path, domain, resolution, tags, notes, extras, created_at, updated_at \
     FROM connections";

/// Persistent connection store backed by SQLite
#[derive(Debug)]
pub struct ConnectionStore {
    conn: rusqlite::Connection,
    path: Option<PathBuf>,
    keys: KeyManager,
    key: OnceCell<EncryptionKey>,
}

impl ConnectionStore {
    /// Opens (or creates) the database at `path`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the file cannot be created, opened
    /// or migrated.
    pub fn open(path: impl Into<PathBuf>, keys: KeyManager) -> StoreResult<Self> {
        let path = path.into();
        create_private_db_file(&path)
            .map_err(|e| StoreError::Database(format!("{}: {e}", path.display())))?;

        let conn = rusqlite::Connection::open(&path)?;
        let store = Self::init(conn, Some(path), keys)?;
        debug!(path = ?store.path, "Opened connection store");
        Ok(store)
    }

    /// Opens a throwaway in-memory database
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the schema cannot be created.
    pub fn open_in_memory(keys: KeyManager) -> StoreResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Self::init(conn, None, keys)
    }

    fn init(
        mut conn: rusqlite::Connection,
        path: Option<PathBuf>,
        keys: KeyManager,
    ) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        schema::migrate(&mut conn)?;
        Ok(Self {
            conn,
            path,
            keys,
            key: OnceCell::new(),
        })
    }

    /// Returns the database path, or `None` for an in-memory store
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn key(&self) -> StoreResult<&EncryptionKey> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }
        let key = self.keys.ensure_key()?;
        Ok(self.key.get_or_init(|| key))
    }

    fn seal(&self, password: Option<&SecretString>) -> StoreResult<Option<SealedPassword>> {
        match password {
            Some(p) if !p.expose_secret().is_empty() => Ok(Some(crypto::encrypt(p, self.key()?)?)),
            _ => Ok(None),
        }
    }

    /// Adds a new record and returns it without the plaintext password
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for invalid fields,
    /// `StoreError::DuplicateAlias` if the alias is taken, and key or crypto
    /// errors if a password is given but cannot be sealed.
    pub fn add(&mut self, draft: ConnectionDraft) -> StoreResult<Connection> {
        let alias = validation::alias(&draft.alias)?;
        let host = validation::host(&draft.host)?;
        let port = validation::port(draft.port)?;
        let tags = validation::tags(draft.tags)?;
        let extras = validation::extras(draft.extras)?;

        if self.alias_exists(&alias)? {
            return Err(StoreError::DuplicateAlias(alias));
        }

        let sealed = self.seal(draft.password.as_ref())?;
        let now = Utc::now().to_rfc3339();

        let inserted = self.conn.execute(
            "INSERT INTO connections (alias, protocol, host, port, username, password, \
             ssh_key_path, domain, resolution, tags, notes, extras, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            params![
                alias,
                draft.protocol.as_str(),
                host,
                port,
                validation::optional_text(draft.username),
                sealed.as_ref().map(SealedPassword::as_bytes),
                draft.ssh_key_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
                validation::optional_text(draft.domain),
                draft.resolution.map(|r| r.to_string()),
                tags_to_json(&tags)?,
                validation::optional_text(draft.notes),
                extras_to_json(&extras)?,
                now,
            ],
        );
        map_unique_violation(inserted, &alias)?;

        let id = self.conn.last_insert_rowid();
        info!(id, alias = %alias, protocol = %draft.protocol, "Added connection");
        self.get_by_id(id)
    }

    /// Adds a new record and returns it with the plaintext password revealed
    ///
    /// # Errors
    ///
    /// Same as [`ConnectionStore::add`].
    pub fn add_revealed(&mut self, draft: ConnectionDraft) -> StoreResult<Connection> {
        let plaintext = draft
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty())
            .map(|p| SecretString::from(p.expose_secret().to_owned()));
        let mut record = self.add(draft)?;
        if let Some(secret) = plaintext {
            record.password = PasswordState::Revealed(secret);
        }
        Ok(record)
    }

    /// Looks up a record by id first, then by alias
    ///
    /// Only a key made entirely of ASCII digits is tried as an id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if neither matches.
    pub fn get(&self, alias_or_id: &str) -> StoreResult<Connection> {
        let key = alias_or_id.trim();
        if validation::is_id_key(key) {
            if let Ok(id) = key.parse::<i64>() {
                if let Some(record) = self.find_by_id(id)? {
                    return Ok(record);
                }
            }
        }
        let record = self.find_by_alias(key)?;
        debug!(key, found = record.is_some(), "Looked up connection");
        record.ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    /// Looks up a record by alias only
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` on query failure.
    pub fn find_by_alias(&self, alias: &str) -> StoreResult<Option<Connection>> {
        Ok(self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE alias = ?1"),
                params![alias.trim()],
                row_to_connection,
            )
            .optional()?)
    }

    /// Looks up a record by id
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record has this id.
    pub fn get_by_id(&self, id: i64) -> StoreResult<Connection> {
        self.find_by_id(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn find_by_id(&self, id: i64) -> StoreResult<Option<Connection>> {
        Ok(self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                row_to_connection,
            )
            .optional()?)
    }

    /// Applies `changes` to the record matching `alias_or_id`
    ///
    /// The alias is re-checked for uniqueness only when it changes, and a new
    /// password is sealed again before it is written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound`, `StoreError::DuplicateAlias`,
    /// `StoreError::Validation`, or key and crypto errors for a new password.
    pub fn update(
        &mut self,
        alias_or_id: &str,
        changes: ConnectionChanges,
    ) -> StoreResult<Connection> {
        let existing = self.get(alias_or_id)?;
        self.apply_changes(existing, changes)
    }

    /// Applies `changes` to the record whose alias is exactly `alias`
    ///
    /// # Errors
    ///
    /// Same as [`ConnectionStore::update`].
    pub fn update_by_alias(
        &mut self,
        alias: &str,
        changes: ConnectionChanges,
    ) -> StoreResult<Connection> {
        let existing = self
            .find_by_alias(alias)?
            .ok_or_else(|| StoreError::NotFound(alias.trim().to_string()))?;
        self.apply_changes(existing, changes)
    }

    fn apply_changes(
        &mut self,
        existing: Connection,
        changes: ConnectionChanges,
    ) -> StoreResult<Connection> {
        let id = existing.id;

        let alias = match changes.alias {
            Some(raw) => {
                let alias = validation::alias(&raw)?;
                if alias != existing.alias && self.alias_exists(&alias)? {
                    return Err(StoreError::DuplicateAlias(alias));
                }
                alias
            }
            None => existing.alias.clone(),
        };
        let protocol = changes.protocol.unwrap_or(existing.protocol);
        let host = match changes.host {
            Some(raw) => validation::host(&raw)?,
            None => existing.host.clone(),
        };
        let port = validation::port(changes.port.apply(existing.port))?;
        let username = validation::optional_text(changes.username.apply(existing.username));
        let ssh_key_path = changes.ssh_key_path.apply(existing.ssh_key_path);
        let domain = validation::optional_text(changes.domain.apply(existing.domain));
        let resolution = changes.resolution.apply(existing.resolution);
        let notes = validation::optional_text(changes.notes.apply(existing.notes));
        let tags = match changes.tags {
            Some(raw) => validation::tags(raw)?,
            None => existing.tags,
        };
        let extras = match changes.extras {
            Some(raw) => validation::extras(raw)?,
            None => existing.extras,
        };

        let password = match changes.password {
            FieldUpdate::Keep => None,
            FieldUpdate::Set(secret) => Some(self.seal(Some(&secret))?),
            FieldUpdate::Clear => Some(None),
        };

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE connections SET alias = ?1, protocol = ?2, host = ?3, port = ?4, \
             username = ?5, ssh_key_path = ?6, domain = ?7, resolution = ?8, tags = ?9, \
             notes = ?10, extras = ?11, updated_at = ?12 WHERE id = ?13",
            params![
                alias,
                protocol.as_str(),
                host,
                port,
                username,
                ssh_key_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
                domain,
                resolution.map(|r| r.to_string()),
                tags_to_json(&tags)?,
                notes,
                extras_to_json(&extras)?,
                now,
                id,
            ],
        );
        map_unique_violation(updated, &alias)?;
        if let Some(sealed) = &password {
            tx.execute(
                "UPDATE connections SET password = ?1 WHERE id = ?2",
                params![sealed.as_ref().map(SealedPassword::as_bytes), id],
            )?;
        }
        tx.commit()?;

        info!(id, alias = %alias, password_changed = password.is_some(), "Updated connection");
        self.get_by_id(id)
    }

    /// Deletes the record matching `alias_or_id`
    ///
    /// Deleting is not idempotent: a second delete of the same record fails.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no record matches.
    pub fn delete(&mut self, alias_or_id: &str) -> StoreResult<()> {
        let record = self.get(alias_or_id)?;
        self.conn
            .execute("DELETE FROM connections WHERE id = ?1", params![record.id])?;
        info!(id = record.id, alias = %record.alias, "Deleted connection");
        Ok(())
    }

    /// Returns every record ordered by id
    ///
    /// Passwords stay sealed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` on query failure.
    pub fn list(&self) -> StoreResult<Vec<Connection>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))?;
        let rows = stmt.query_map([], row_to_connection)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Returns the records matching `filter`, ordered by id
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` on query failure.
    pub fn list_filtered(&self, filter: &ConnectionFilter) -> StoreResult<Vec<Connection>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect())
    }

    /// Decrypts the stored password of `record`
    ///
    /// This is the only way to obtain a stored password in plaintext.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the record has no password, key
    /// errors if the key file is unusable, and `CryptoError::Decryption` if the
    /// blob is malformed or fails its integrity check.
    pub fn decrypt_password(&self, record: &Connection) -> StoreResult<SecretString> {
        match &record.password {
            PasswordState::None => Err(StoreError::validation(
                "password",
                format!("connection '{}' has no stored password", record.alias),
            )),
            PasswordState::Revealed(secret) => Ok(secret.clone()),
            PasswordState::Unreadable => Err(CryptoError::Decryption(format!(
                "stored password of '{}' is malformed",
                record.alias
            ))
            .into()),
            PasswordState::Sealed(blob) => {
                let secret = crypto::decrypt(blob, self.key()?).inspect_err(|e| {
                    warn!(alias = %record.alias, error = %e, "Stored password is unreadable");
                })?;
                debug!(alias = %record.alias, "Decrypted password");
                Ok(secret)
            }
        }
    }

    /// Returns the number of records
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` on query failure.
    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM connections", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Returns true if a record uses `alias`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` on query failure.
    pub fn alias_exists(&self, alias: &str) -> StoreResult<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM connections WHERE alias = ?1)",
            params![alias],
            |row| row.get(0),
        )?)
    }
}

fn map_unique_violation(result: rusqlite::Result<usize>, alias: &str) -> StoreResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(StoreError::DuplicateAlias(alias.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn tags_to_json(tags: &BTreeSet<String>) -> StoreResult<String> {
    serde_json::to_string(tags).map_err(|e| StoreError::Database(e.to_string()))
}

fn extras_to_json(extras: &BTreeMap<String, String>) -> StoreResult<String> {
    serde_json::to_string(extras).map_err(|e| StoreError::Database(e.to_string()))
}

fn conversion_error(
    column: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.into())
}

fn parse_timestamp(column: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn row_to_connection(row: &Row<'_>) -> rusqlite::Result<Connection> {
    let alias: String = row.get(1)?;

    let protocol: String = row.get(2)?;
    let protocol: ProtocolType = protocol.parse().map_err(|e| conversion_error(2, e))?;

    let port: Option<i64> = row.get(4)?;
    let port = port
        .map(u16::try_from)
        .transpose()
        .map_err(|e| conversion_error(4, e))?;

    let password = match row.get::<_, Option<Vec<u8>>>(6)? {
        None => PasswordState::None,
        Some(bytes) => match SealedPassword::from_bytes(bytes) {
            Ok(blob) => PasswordState::Sealed(blob),
            Err(e) => {
                warn!(alias = %alias, error = %e, "Stored password blob is malformed");
                PasswordState::Unreadable
            }
        },
    };

    let resolution: Option<String> = row.get(9)?;
    let resolution = resolution
        .map(|r| r.parse::<Resolution>())
        .transpose()
        .map_err(|e| conversion_error(9, e))?;

    let tags: String = row.get(10)?;
    let tags: BTreeSet<String> =
        serde_json::from_str(&tags).map_err(|e| conversion_error(10, e))?;
    let extras: String = row.get(12)?;
    let extras: BTreeMap<String, String> =
        serde_json::from_str(&extras).map_err(|e| conversion_error(12, e))?;

    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;

    Ok(Connection {
        id: row.get(0)?,
        alias,
        protocol,
        host: row.get(3)?,
        port,
        username: row.get(5)?,
        password,
        ssh_key_path: row.get::<_, Option<String>>(7)?.map(PathBuf::from),
        domain: row.get(8)?,
        resolution,
        tags,
        notes: row.get(11)?,
        extras,
        created_at: parse_timestamp(13, &created_at)?,
        updated_at: parse_timestamp(14, &updated_at)?,
    })
}

/// Creates an empty database file readable only by the owner, unless it exists
fn create_private_db_file(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    match options.open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}
