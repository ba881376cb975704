//! Property-based tests for password sealing
//!
//! Sealed blobs must open to the original plaintext with the right key and
//! must never open after any single byte has been changed.

use connman_core::crypto::{
    decrypt, encrypt, EncryptionKey, KeyManager, SealedPassword, BLOB_OVERHEAD,
};
use connman_core::error::ErrorKind;
use proptest::prelude::*;
use secrecy::{ExposeSecret, SecretString};
use tempfile::TempDir;

// ========== Strategies ==========

/// Strategy for generating passwords, including non-ASCII ones
fn arb_password() -> impl Strategy<Value = String> {
    prop_oneof!["[ -~]{1,64}", "\\PC{1,32}"]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sealed_password_round_trips(password in arb_password()) {
        let key = EncryptionKey::generate().unwrap();
        let sealed = encrypt(&SecretString::from(password.clone()), &key).unwrap();

        prop_assert_eq!(sealed.as_bytes().len(), password.len() + BLOB_OVERHEAD);
        let opened = decrypt(&sealed, &key).unwrap();
        prop_assert_eq!(opened.expose_secret(), password.as_str());
    }

    #[test]
    fn flipped_byte_is_detected(
        password in arb_password(),
        position in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let key = EncryptionKey::generate().unwrap();
        let sealed = encrypt(&SecretString::from(password), &key).unwrap();

        let mut bytes = sealed.into_bytes();
        let i = position.index(bytes.len());
        bytes[i] ^= mask;

        // A damaged version byte is already refused when the blob is wrapped
        match SealedPassword::from_bytes(bytes) {
            Ok(tampered) => {
                let err = decrypt(&tampered, &key).unwrap_err();
                prop_assert_eq!(err.kind(), ErrorKind::Decryption);
            }
            Err(err) => prop_assert_eq!(err.kind(), ErrorKind::Decryption),
        }
    }

    #[test]
    fn other_key_cannot_open(password in arb_password()) {
        let key = EncryptionKey::generate().unwrap();
        let other = EncryptionKey::generate().unwrap();
        let sealed = encrypt(&SecretString::from(password), &key).unwrap();

        prop_assert!(decrypt(&sealed, &other).is_err());
    }
}

#[test]
fn key_file_survives_reload() {
    let temp = TempDir::new().unwrap();
    let manager = KeyManager::new(temp.path().join("cm.key"));
    assert!(!manager.key_exists());

    let created = manager.ensure_key().unwrap();
    let sealed = encrypt(&SecretString::from("hunter2".to_string()), &created).unwrap();

    let reloaded = KeyManager::new(temp.path().join("cm.key")).load_key().unwrap();
    assert_eq!(decrypt(&sealed, &reloaded).unwrap().expose_secret(), "hunter2");
}

#[test]
fn truncated_key_file_is_corrupt() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("cm.key");
    std::fs::write(&path, [7u8; 5]).unwrap();

    let err = KeyManager::new(&path).load_key().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyCorrupt);
}
