//! Tests for JSON import and export
//!
//! Covers per-record error isolation, the three conflict policies, the
//! plaintext export contract, and moving a store between two keys through
//! an export file.

use std::path::PathBuf;

use connman_core::crypto::KeyManager;
use connman_core::error::{ErrorKind, ExchangeError};
use connman_core::exchange::{export_all, import_all, Confirmation, ConflictPolicy};
use connman_core::models::{ConnectionDraft, ProtocolType};
use connman_core::store::ConnectionStore;
use proptest::prelude::*;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tempfile::TempDir;

fn open_store(temp: &TempDir, name: &str) -> ConnectionStore {
    ConnectionStore::open(
        temp.path().join(format!("{name}.db")),
        KeyManager::new(temp.path().join(format!("{name}.key"))),
    )
    .unwrap()
}

fn write_json(temp: &TempDir, value: &Value) -> PathBuf {
    let path = temp.path().join("import.json");
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn existing_db1(store: &mut ConnectionStore) {
    store
        .add(
            ConnectionDraft::new("db1", ProtocolType::Ssh, "old.lan")
                .with_username("admin")
                .with_password("old-pw")
                .with_tags(["prod"]),
        )
        .unwrap();
}

fn incoming_db1() -> Value {
    json!([{
        "alias": "db1",
        "protocol": "ssh",
        "host": "new.lan",
        "port": 2222,
        "password": "new-pw"
    }])
}

// ========== Strategies ==========

/// Strategy for generating a batch of distinct, valid records
fn arb_records() -> impl Strategy<Value = Vec<(String, ProtocolType, String, Option<String>)>> {
    prop::collection::btree_map(
        "[a-z][a-z0-9]{0,8}",
        (
            prop::sample::select(ProtocolType::all().to_vec()),
            "[a-z]{1,8}\\.lan",
            prop::option::of("[!-~]{1,24}"),
        ),
        1..8,
    )
    .prop_map(|records| {
        records
            .into_iter()
            .map(|(alias, (protocol, host, password))| (alias, protocol, host, password))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn export_then_import_moves_store_between_keys(records in arb_records()) {
        let temp = TempDir::new().unwrap();
        let mut source = open_store(&temp, "source");
        for (alias, protocol, host, password) in &records {
            let mut draft = ConnectionDraft::new(alias, *protocol, host).with_tags(["moved"]);
            if let Some(password) = password {
                draft = draft.with_password(password.clone());
            }
            source.add(draft).unwrap();
        }

        let file = temp.path().join("export.json");
        let summary = export_all(&source, &file, Confirmation::Confirmed).unwrap();
        prop_assert_eq!(summary.count, records.len());
        prop_assert!(summary.unreadable.is_empty());

        let mut target = open_store(&temp, "target");
        let report = import_all(&mut target, &file, ConflictPolicy::Skip, Confirmation::Pending).unwrap();
        prop_assert_eq!(report.imported, records.len());
        prop_assert!(!report.has_errors());

        for (alias, protocol, host, password) in &records {
            let moved = target.get(alias).unwrap();
            prop_assert_eq!(moved.protocol, *protocol);
            prop_assert_eq!(&moved.host, host);
            prop_assert!(moved.has_tag("moved"));
            match password {
                Some(expected) => {
                    let opened = target.decrypt_password(&moved).unwrap();
                    prop_assert_eq!(opened.expose_secret(), expected.as_str());
                }
                None => prop_assert!(!moved.password.is_set()),
            }
        }
    }
}

#[test]
fn one_bad_record_does_not_stop_the_batch() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp, "cm");
    let path = write_json(
        &temp,
        &json!([
            {"alias": "a1", "protocol": "ssh", "host": "a1.lan"},
            {"alias": "a2", "protocol": "rdp", "host": "a2.lan", "password": "pw"},
            {"alias": "a3", "protocol": "vnc"},
            {"alias": "a4", "protocol": "http", "host": "10.0.0.4"},
            {"alias": "a5", "protocol": "vmrc", "host": "esx.lan"}
        ]),
    );

    let report = import_all(&mut store, &path, ConflictPolicy::Skip, Confirmation::Pending).unwrap();

    assert_eq!(report.imported, 4);
    assert_eq!(report.errors.len(), 1);
    let error = &report.errors[0];
    assert_eq!(error.index, 2);
    assert_eq!(error.alias.as_deref(), Some("a3"));
    assert_eq!(error.kind, ErrorKind::Validation);
    assert!(error.reason.contains("host"));
    assert_eq!(store.count().unwrap(), 4);
    assert!(store.get("a3").is_err());
}

#[test]
fn skip_leaves_existing_record_identical() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp, "cm");
    existing_db1(&mut store);
    let before = store.get("db1").unwrap();

    let path = write_json(&temp, &incoming_db1());
    let report = import_all(&mut store, &path, ConflictPolicy::Skip, Confirmation::Pending).unwrap();

    assert_eq!(report.imported, 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].alias, "db1");
    assert_eq!(store.get("db1").unwrap(), before);
}

#[test]
fn overwrite_replaces_fields_but_keeps_id() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp, "cm");
    existing_db1(&mut store);
    let before = store.get("db1").unwrap();

    let path = write_json(&temp, &incoming_db1());
    let err = import_all(&mut store, &path, ConflictPolicy::Overwrite, Confirmation::Pending)
        .unwrap_err();
    assert!(matches!(err, ExchangeError::ConfirmationRequired(_)));
    assert_eq!(store.get("db1").unwrap(), before);

    let report =
        import_all(&mut store, &path, ConflictPolicy::Overwrite, Confirmation::Confirmed).unwrap();
    assert_eq!(report.overwritten, vec!["db1".to_string()]);

    let after = store.get("db1").unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.host, "new.lan");
    assert_eq!(after.port, Some(2222));
    assert_eq!(after.username, None);
    assert!(after.tags.is_empty());
    assert_eq!(store.decrypt_password(&after).unwrap().expose_secret(), "new-pw");
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn rename_keeps_both_records() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp, "cm");
    existing_db1(&mut store);
    let before = store.get("db1").unwrap();

    let path = write_json(&temp, &incoming_db1());
    let report = import_all(&mut store, &path, ConflictPolicy::Rename, Confirmation::Pending).unwrap();

    assert_eq!(report.renamed.len(), 1);
    assert_eq!(report.renamed[0].to, "db1-2");
    assert_eq!(store.get("db1").unwrap(), before);
    let renamed = store.get("db1-2").unwrap();
    assert_eq!(renamed.host, "new.lan");
    assert!(renamed.id > before.id);
}

#[test]
fn export_writes_plaintext_password() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp, "cm");
    store
        .add(ConnectionDraft::new("db1", ProtocolType::Ssh, "db.lan").with_password("hunter2"))
        .unwrap();
    store
        .add(ConnectionDraft::new("web1", ProtocolType::Http, "10.0.0.5"))
        .unwrap();

    let file = temp.path().join("out.json");
    let err = export_all(&store, &file, Confirmation::Pending).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfirmationRequired);
    assert!(!file.exists());

    let summary = export_all(&store, &file, Confirmation::Confirmed).unwrap();
    assert!(summary.plaintext_warning);
    assert_eq!(summary.count, 2);

    let exported: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(exported[0]["alias"], "db1");
    assert_eq!(exported[0]["password"], "hunter2");
    assert!(exported[1].get("password").is_none());
}

#[test]
fn document_that_is_not_an_array_is_rejected() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp, "cm");
    let path = write_json(&temp, &json!({"alias": "db1"}));

    let err = import_all(&mut store, &path, ConflictPolicy::Skip, Confirmation::Pending).unwrap_err();
    assert!(matches!(err, ExchangeError::Parse { .. }));
    assert_eq!(store.count().unwrap(), 0);
}
