//! AES-256-GCM sealing of password fields.
//!
//! Blob layout: `version (1) || nonce (12) || ciphertext || tag (16)`.
//! The version byte is bound to the ciphertext as associated data.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use secrecy::{ExposeSecret, SecretString};

use super::key::EncryptionKey;
use crate::error::{CryptoError, CryptoResult};

const BLOB_VERSION: u8 = 1;
const TAG_LEN: usize = 16;

/// Bytes a sealed blob adds on top of the plaintext length
pub const BLOB_OVERHEAD: usize = 1 + NONCE_LEN + TAG_LEN;

/// An encrypted password as stored in the database
///
/// The contents are opaque outside the `crypto` module. Construction from
/// raw bytes only checks the layout; authenticity is verified by [`decrypt`].
#[derive(Clone, PartialEq, Eq)]
pub struct SealedPassword(Vec<u8>);

impl SealedPassword {
    /// Wraps a stored blob after checking its layout
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decryption` if the blob is too short or carries
    /// an unknown version byte.
    pub fn from_bytes(bytes: Vec<u8>) -> CryptoResult<Self> {
        if bytes.len() < BLOB_OVERHEAD {
            return Err(CryptoError::Decryption(format!(
                "blob is {} bytes, shorter than the minimum {BLOB_OVERHEAD}",
                bytes.len()
            )));
        }
        if bytes[0] != BLOB_VERSION {
            return Err(CryptoError::Decryption(format!(
                "unsupported blob version {}",
                bytes[0]
            )));
        }
        Ok(Self(bytes))
    }

    /// Returns the raw blob for persistence
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the blob, returning the raw bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl std::fmt::Debug for SealedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SealedPassword({} bytes)", self.0.len())
    }
}

fn aead_key(key: &EncryptionKey) -> CryptoResult<LessSafeKey> {
    let unbound = UnboundKey::new(&AES_256_GCM, key.expose())
        .map_err(|_| CryptoError::Encryption("invalid key length".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypts a plaintext password into a self-contained blob
///
/// Every call draws a fresh random nonce, so sealing the same password twice
/// yields different blobs.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the random number generator or the
/// cipher fails.
pub fn encrypt(plaintext: &SecretString, key: &EncryptionKey) -> CryptoResult<SealedPassword> {
    let sealing_key = aead_key(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| CryptoError::Encryption("random nonce generation failed".to_string()))?;

    let mut in_out = plaintext.expose_secret().as_bytes().to_vec();
    sealing_key
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::from([BLOB_VERSION]),
            &mut in_out,
        )
        .map_err(|_| CryptoError::Encryption("sealing failed".to_string()))?;

    let mut blob = Vec::with_capacity(1 + NONCE_LEN + in_out.len());
    blob.push(BLOB_VERSION);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&in_out);
    Ok(SealedPassword(blob))
}

/// Decrypts a blob produced by [`encrypt`]
///
/// # Errors
///
/// Returns `CryptoError::Decryption` if the blob is malformed, was sealed
/// with a different key, or has been modified.
pub fn decrypt(sealed: &SealedPassword, key: &EncryptionKey) -> CryptoResult<SecretString> {
    let blob = sealed.as_bytes();
    if blob.len() < BLOB_OVERHEAD || blob[0] != BLOB_VERSION {
        return Err(CryptoError::Decryption("malformed blob".to_string()));
    }

    let opening_key = aead_key(key)?;
    let nonce = Nonce::try_assume_unique_for_key(&blob[1..=NONCE_LEN])
        .map_err(|_| CryptoError::Decryption("malformed nonce".to_string()))?;

    let mut in_out = blob[1 + NONCE_LEN..].to_vec();
    let plaintext = opening_key
        .open_in_place(nonce, Aad::from([BLOB_VERSION]), &mut in_out)
        .map_err(|_| {
            CryptoError::Decryption("integrity check failed (wrong key or tampered data)".to_string())
        })?;

    let text = String::from_utf8(plaintext.to_vec())
        .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".to_string()))?;
    Ok(SecretString::from(text))
}
