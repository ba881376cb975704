//! Protocol registry for looking up protocol handlers

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::ProtocolType;

use super::{HttpProtocol, Protocol, RdpProtocol, SshProtocol, VmrcProtocol, VncProtocol};

/// Registry for protocol handlers
///
/// The `ProtocolRegistry` provides a centralized way to look up protocol
/// handlers by their identifier or protocol type. It is initialized with a
/// handler for every [`ProtocolType`].
pub struct ProtocolRegistry {
    protocols: HashMap<ProtocolType, Arc<dyn Protocol>>,
}

impl ProtocolRegistry {
    /// Creates a new protocol registry with all supported protocols
    #[must_use]
    pub fn new() -> Self {
        let handlers: [Arc<dyn Protocol>; 5] = [
            Arc::new(SshProtocol::new()),
            Arc::new(RdpProtocol::new()),
            Arc::new(VncProtocol::new()),
            Arc::new(VmrcProtocol::new()),
            Arc::new(HttpProtocol::new()),
        ];
        let protocols = handlers
            .into_iter()
            .map(|handler| (handler.protocol_type(), handler))
            .collect();
        Self { protocols }
    }

    /// Gets a protocol handler by its identifier (e.g., "ssh")
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Protocol>> {
        let protocol = id.parse::<ProtocolType>().ok()?;
        self.protocols.get(&protocol).cloned()
    }

    /// Gets the handler for a protocol type
    #[must_use]
    pub fn get_by_type(&self, protocol_type: ProtocolType) -> Arc<dyn Protocol> {
        self.protocols
            .get(&protocol_type)
            .cloned()
            .unwrap_or_else(|| Arc::new(HttpProtocol::new()))
    }

    /// Returns all registered protocol IDs
    #[must_use]
    pub fn protocol_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.protocols.values().map(|p| p.protocol_id()).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered protocols
    #[must_use]
    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    /// Returns true if no protocols are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
