//! Password encryption for `ConnManager`
//!
//! Stored passwords are sealed with AES-256-GCM using a single symmetric key
//! kept in a key file next to the database. This module owns both halves:
//!
//! - [`KeyManager`] creates the key file on first use and loads it afterwards.
//! - [`encrypt`] and [`decrypt`] turn plaintext passwords into self-contained
//!   [`SealedPassword`] blobs and back.
//!
//! Key material never leaves this module; callers only hold an opaque
//! [`EncryptionKey`] handle.

mod codec;
mod key;

pub use codec::{decrypt, encrypt, SealedPassword, BLOB_OVERHEAD};
pub use key::{EncryptionKey, KeyManager, KEY_LEN};

pub(crate) use key::write_private_file;
