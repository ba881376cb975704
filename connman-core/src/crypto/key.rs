//! Encryption key file management.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretBox};
use tracing::{debug, info, warn};

use crate::error::{KeyError, KeyResult};

/// Length of the raw key material in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Symmetric key used to seal stored passwords
///
/// The key bytes are zeroized on drop and are only readable inside the
/// `crypto` module.
pub struct EncryptionKey {
    bytes: SecretBox<[u8; KEY_LEN]>,
}

impl EncryptionKey {
    pub(super) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            bytes: SecretBox::new(Box::new(bytes)),
        }
    }

    /// Generates a fresh random key
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Rng` if the system random number generator fails.
    pub fn generate() -> KeyResult<Self> {
        let mut bytes = [0u8; KEY_LEN];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| KeyError::Rng)?;
        Ok(Self::from_bytes(bytes))
    }

    pub(super) fn expose(&self) -> &[u8; KEY_LEN] {
        self.bytes.expose_secret()
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Creates and loads the key file at a fixed location
#[derive(Debug, Clone)]
pub struct KeyManager {
    path: PathBuf,
}

impl KeyManager {
    /// Creates a key manager for the key file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the key file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a key file exists
    #[must_use]
    pub fn key_exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the key, creating the key file first if it does not exist
    ///
    /// A new key file is written to a temporary sibling and then moved into
    /// place, so an interrupted first run never leaves a truncated key behind.
    /// If another process created the key in the meantime, that key wins.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Access` if the file cannot be read or created, and
    /// `KeyError::Corrupt` if it exists but does not hold a valid key.
    pub fn ensure_key(&self) -> KeyResult<EncryptionKey> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                self.check_permissions();
                self.parse(&bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => self.create(),
            Err(e) => Err(self.access_error(&e)),
        }
    }

    /// Loads an existing key without creating one
    ///
    /// # Errors
    ///
    /// Returns `KeyError::Access` if the file is missing or unreadable, and
    /// `KeyError::Corrupt` if it does not hold a valid key.
    pub fn load_key(&self) -> KeyResult<EncryptionKey> {
        let bytes = fs::read(&self.path).map_err(|e| self.access_error(&e))?;
        self.check_permissions();
        self.parse(&bytes)
    }

    fn parse(&self, bytes: &[u8]) -> KeyResult<EncryptionKey> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| KeyError::Corrupt {
            path: self.path.clone(),
            reason: format!("expected {KEY_LEN} bytes, found {}", bytes.len()),
        })?;
        debug!(path = %self.path.display(), "Loaded encryption key");
        Ok(EncryptionKey::from_bytes(key))
    }

    fn create(&self) -> KeyResult<EncryptionKey> {
        let key = EncryptionKey::generate()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent).map_err(|e| self.access_error(&e))?;
        }

        let tmp_path = self.temp_path();
        write_private_file(&tmp_path, key.expose()).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.access_error(&e)
        })?;

        match fs::hard_link(&tmp_path, &self.path) {
            Ok(()) => {
                let _ = fs::remove_file(&tmp_path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let _ = fs::remove_file(&tmp_path);
                debug!(path = %self.path.display(), "Key file appeared concurrently, using it");
                return self.load_key();
            }
            Err(_) => {
                fs::rename(&tmp_path, &self.path).map_err(|e| {
                    let _ = fs::remove_file(&tmp_path);
                    self.access_error(&e)
                })?;
            }
        }

        info!(path = %self.path.display(), "Created new encryption key");
        Ok(key)
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "key".into(), |n| n.to_string_lossy().into_owned());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", std::process::id()))
    }

    #[cfg(unix)]
    fn check_permissions(&self) {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(meta) = fs::metadata(&self.path) {
            let mode = meta.permissions().mode() & 0o777;
            if mode & 0o077 != 0 {
                warn!(
                    path = %self.path.display(),
                    mode = %format!("{mode:o}"),
                    "Key file is readable by other users; run chmod 600 on it"
                );
            }
        }
    }

    #[cfg(not(unix))]
    fn check_permissions(&self) {}

    fn access_error(&self, err: &std::io::Error) -> KeyError {
        KeyError::Access {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    if dir.is_dir() {
        return Ok(());
    }
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

/// Writes `data` to a new file readable only by the owner and syncs it to disk
pub(crate) fn write_private_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}
