//! Per-session environment threaded through server operations.

use std::collections::{BTreeMap, HashMap};

use crate::domain::ConnectionRequest;
use crate::protocol::ConnectionIdentifiers;

/// Everything the server needs to rebuild a connection's context: the
/// upgrade request, the bound identity and the encoded state of the
/// connection and of each subscription.
#[derive(Debug, Clone)]
pub struct SessionEnv {
    /// Upgrade request.
    pub request: ConnectionRequest,
    /// Identity bound on connect.
    pub identifiers: ConnectionIdentifiers,
    /// Encoded connection state.
    pub cstate: HashMap<String, String>,
    /// Encoded subscription state keyed by channel identifier.
    pub istates: HashMap<String, HashMap<String, String>>,
}

impl SessionEnv {
    /// Creates an environment for a fresh connection.
    #[must_use]
    pub fn new(request: ConnectionRequest) -> Self {
        Self {
            request,
            identifiers: ConnectionIdentifiers::new(),
            cstate: HashMap::new(),
            istates: HashMap::new(),
        }
    }

    /// Merges connection-state changes from a reply.
    pub fn merge_connection_state(&mut self, changes: &BTreeMap<String, String>) {
        for (key, value) in changes {
            self.cstate.insert(key.clone(), value.clone());
        }
    }

    /// Merges subscription-state changes for `identifier` from a reply.
    pub fn merge_channel_state(&mut self, identifier: &str, changes: &BTreeMap<String, String>) {
        if changes.is_empty() {
            return;
        }
        let state = self.istates.entry(identifier.to_string()).or_default();
        for (key, value) in changes {
            state.insert(key.clone(), value.clone());
        }
    }

    /// Drops the state of a subscription that ended.
    pub fn remove_channel_state(&mut self, identifier: &str) {
        self.istates.remove(identifier);
    }
}
