//! End-to-end tests from a stored connection to a client command line

use connman_core::config::ResolvedConfig;
use connman_core::crypto::KeyManager;
use connman_core::models::{ConnectionDraft, PasswordState, ProtocolType};
use connman_core::protocol::{build_launch_command, prepare_connect, url_opener, PasswordHandoff};
use connman_core::store::ConnectionStore;
use connman_core::AppContext;
use tempfile::TempDir;

#[test]
fn web_connection_without_password_asks_interactively() {
    let temp = TempDir::new().unwrap();
    let key_path = temp.path().join("cm.key");
    let mut store = ConnectionStore::open(temp.path().join("cm.db"), KeyManager::new(&key_path))
        .unwrap();

    store
        .add(ConnectionDraft::new("web1", ProtocolType::Http, "10.0.0.5"))
        .unwrap();
    let record = store.get("web1").unwrap();
    assert_eq!(record.password, PasswordState::None);

    let request = prepare_connect(&store, "web1").unwrap();
    assert!(matches!(request.password, PasswordHandoff::PromptInteractively));
    assert!(!key_path.exists(), "no password was decrypted");

    let command = build_launch_command(&request).unwrap();
    assert_eq!(command.program, url_opener());
    assert_eq!(command.plain_args(), vec!["http://10.0.0.5"]);
}

#[test]
fn ssh_password_never_appears_on_the_command_line() {
    let temp = TempDir::new().unwrap();
    let mut store =
        ConnectionStore::open_in_memory(KeyManager::new(temp.path().join("cm.key"))).unwrap();
    store
        .add(
            ConnectionDraft::new("db1", ProtocolType::Ssh, "db.lan")
                .with_username("admin")
                .with_port(2222)
                .with_password("hunter2"),
        )
        .unwrap();

    let request = prepare_connect(&store, "db1").unwrap();
    let command = build_launch_command(&request).unwrap();

    assert!(!command.plain_args().iter().any(|a| a.contains("hunter2")));
    assert!(!command.to_string().contains("hunter2"));
    assert!(command.plain_args().contains(&"admin@db.lan".to_string()));
}

#[test]
fn context_opens_store_from_config() {
    let temp = TempDir::new().unwrap();
    let config = ResolvedConfig {
        db_path: temp.path().join("data").join("cm.db"),
        key_path: temp.path().join("data").join("cm.key"),
        log_level: None,
    };

    let mut ctx = AppContext::open(config).unwrap();
    ctx.store_mut()
        .add(ConnectionDraft::new("lab", ProtocolType::Vnc, "lab.lan"))
        .unwrap();
    assert_eq!(ctx.store().count().unwrap(), 1);
    assert!(temp.path().join("data").join("cm.db").exists());
}
