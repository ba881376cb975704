//! Property-based tests for the connection store
//!
//! Covers alias uniqueness, id monotonicity and password handling through
//! the public store API.

use connman_core::crypto::KeyManager;
use connman_core::error::{ErrorKind, StoreError};
use connman_core::models::{ConnectionChanges, ConnectionDraft, PasswordState, ProtocolType};
use connman_core::store::ConnectionStore;
use proptest::prelude::*;
use secrecy::ExposeSecret;
use tempfile::TempDir;

// ========== Strategies ==========

/// Strategy for generating valid aliases
fn arb_alias() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,12}"
}

/// Strategy for generating protocol types
fn arb_protocol() -> impl Strategy<Value = ProtocolType> {
    prop::sample::select(ProtocolType::all().to_vec())
}

/// Strategy for generating hosts
fn arb_host() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,10}\\.lan",
        (1u8..=254, 1u8..=254).prop_map(|(a, b)| format!("10.0.{a}.{b}")),
    ]
}

fn open_store(temp: &TempDir) -> ConnectionStore {
    ConnectionStore::open(temp.path().join("cm.db"), KeyManager::new(temp.path().join("cm.key")))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn duplicate_alias_leaves_existing_record(
        alias in arb_alias(),
        first in (arb_protocol(), arb_host()),
        second in (arb_protocol(), arb_host()),
    ) {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let original = store.add(ConnectionDraft::new(&alias, first.0, first.1)).unwrap();

        let err = store
            .add(ConnectionDraft::new(&alias, second.0, second.1))
            .unwrap_err();
        prop_assert!(matches!(err, StoreError::DuplicateAlias(_)));
        prop_assert_eq!(err.kind(), ErrorKind::DuplicateAlias);

        prop_assert_eq!(store.get(&alias).unwrap(), original);
        prop_assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn deleted_ids_are_never_reused(
        aliases in prop::collection::btree_set(arb_alias(), 2..8),
        delete_index in any::<prop::sample::Index>(),
    ) {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        let aliases: Vec<String> = aliases.into_iter().collect();

        let mut ids = Vec::new();
        for alias in &aliases {
            ids.push(store.add(ConnectionDraft::new(alias, ProtocolType::Ssh, "h.lan")).unwrap().id);
        }
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let victim = &aliases[delete_index.index(aliases.len())];
        let victim_id = store.get(victim).unwrap().id;
        store.delete(victim).unwrap();

        let readded = store.add(ConnectionDraft::new(victim, ProtocolType::Ssh, "h.lan")).unwrap();
        prop_assert!(readded.id > *ids.iter().max().unwrap());
        prop_assert_ne!(readded.id, victim_id);
    }

    #[test]
    fn stored_password_is_sealed_and_recoverable(
        alias in arb_alias(),
        password in "[ -~]{1,40}",
    ) {
        let temp = TempDir::new().unwrap();
        let mut store = open_store(&temp);
        store
            .add(ConnectionDraft::new(&alias, ProtocolType::Rdp, "win.lan").with_password(password.clone()))
            .unwrap();

        let record = store.get(&alias).unwrap();
        prop_assert!(matches!(record.password, PasswordState::Sealed(_)));
        let opened = store.decrypt_password(&record).unwrap();
        prop_assert_eq!(opened.expose_secret(), password.as_str());
    }
}

#[test]
fn all_digit_alias_is_rejected() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let err = store
        .add(ConnectionDraft::new("42", ProtocolType::Ssh, "h.lan"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn signed_integer_alias_is_rejected() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    store
        .add(ConnectionDraft::new("first", ProtocolType::Ssh, "a.lan"))
        .unwrap();
    let other = store
        .add(ConnectionDraft::new("other", ProtocolType::Ssh, "b.lan"))
        .unwrap();

    for alias in ["+2", "-1", "+0"] {
        let err = store
            .add(ConnectionDraft::new(alias, ProtocolType::Ssh, "c.lan"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.get(alias).unwrap_err().kind(), ErrorKind::NotFound);
    }
    let err = store
        .update("first", ConnectionChanges::default().with_alias("+2"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(store.delete("+2").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(store.get("2").unwrap(), other);
    assert_eq!(store.count().unwrap(), 2);
}

#[test]
fn get_resolves_id_and_alias() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let added = store
        .add(ConnectionDraft::new("db1", ProtocolType::Ssh, "db.lan"))
        .unwrap();

    assert_eq!(store.get("db1").unwrap(), added);
    assert_eq!(store.get(&added.id.to_string()).unwrap(), added);
    assert_eq!(store.get("nope").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn update_keeps_id_and_reseals_password() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    let added = store
        .add(ConnectionDraft::new("db1", ProtocolType::Ssh, "db.lan").with_password("old"))
        .unwrap();

    let updated = store
        .update(
            "db1",
            ConnectionChanges::default()
                .with_alias("db-primary")
                .with_password("new"),
        )
        .unwrap();

    assert_eq!(updated.id, added.id);
    assert_eq!(updated.alias, "db-primary");
    assert_ne!(updated.password, added.password);
    assert_eq!(
        store.decrypt_password(&updated).unwrap().expose_secret(),
        "new"
    );
    assert_eq!(store.get("db1").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn listing_survives_a_damaged_key_file() {
    let temp = TempDir::new().unwrap();
    {
        let mut store = open_store(&temp);
        store
            .add(ConnectionDraft::new("db1", ProtocolType::Ssh, "db.lan").with_password("pw"))
            .unwrap();
        store
            .add(ConnectionDraft::new("web1", ProtocolType::Http, "10.0.0.5"))
            .unwrap();
    }
    std::fs::write(temp.path().join("cm.key"), b"garbage").unwrap();

    let store = open_store(&temp);
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);

    let err = store.decrypt_password(&listed[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyCorrupt);
}
