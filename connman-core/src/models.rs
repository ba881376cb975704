//! Core data models for `ConnManager`
//!
//! This module defines the connection record, the drafts and change sets used
//! to create and edit records, and the protocol enumeration.

mod connection;
mod protocol;

pub use connection::{
    Connection, ConnectionChanges, ConnectionDraft, FieldUpdate, PasswordState, MASKED_PASSWORD,
    UNREADABLE_PASSWORD,
};
pub use protocol::{ParseProtocolError, ProtocolType, Resolution};
