//! `ConnManager` Core Library
//!
//! This crate provides the core of the `cm` connection manager: the encrypted
//! connection store and its CRUD contract, password encryption and key file
//! management, JSON import/export, search and filtering, configuration, and
//! the launcher interface that turns a stored connection into a client
//! command line.

pub mod config;
pub mod context;
pub mod crypto;
pub mod error;
pub mod exchange;
pub mod models;
pub mod protocol;
pub mod search;
pub mod store;

pub use config::{ConfigManager, ConnManConfig, ResolvedConfig};
pub use context::AppContext;
pub use crypto::{EncryptionKey, KeyManager, SealedPassword};
pub use error::{
    ConfigError, ConfigResult, ConnManError, CryptoError, CryptoResult, ErrorKind, ExchangeError,
    ExchangeResult, KeyError, KeyResult, LaunchError, LaunchResult, Result, StoreError,
    StoreResult,
};
pub use exchange::{
    export_all, import_all, Confirmation, ConflictPolicy, ExportSummary, ImportReport,
    RecordError,
};
pub use models::{
    Connection, ConnectionChanges, ConnectionDraft, FieldUpdate, PasswordState, ProtocolType,
    Resolution, MASKED_PASSWORD, UNREADABLE_PASSWORD,
};
pub use protocol::{
    build_launch_command, detect_client, prepare_connect, ClientInfo, ConnectRequest,
    LaunchCommand, PasswordHandoff, Protocol, ProtocolRegistry,
};
pub use search::{
    filter_by_protocol, filter_by_tag, search, ConnectionFilter, SearchError, SearchQuery,
};
pub use store::ConnectionStore;
