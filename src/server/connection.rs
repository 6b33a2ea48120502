//! Connection context handed to connection and channel handlers.

use crate::domain::{ChannelState, ConnectionRequest};
use crate::protocol::{ConnectionIdentifiers, ServerMessage};

/// One client connection as seen by a handler invocation.
///
/// Built fresh for every server operation from the session's request,
/// identifiers and connection state; whatever the handler changes is
/// carried back in the operation's reply.
#[derive(Debug)]
pub struct Connection<'a> {
    request: &'a ConnectionRequest,
    identifiers: ConnectionIdentifiers,
    state: ChannelState,
    transmissions: Vec<ServerMessage>,
}

impl<'a> Connection<'a> {
    pub(crate) fn new(
        request: &'a ConnectionRequest,
        identifiers: ConnectionIdentifiers,
        state: ChannelState,
    ) -> Self {
        Self {
            request,
            identifiers,
            state,
            transmissions: Vec::new(),
        }
    }

    /// The upgrade request the connection was opened with.
    #[must_use]
    pub fn request(&self) -> &ConnectionRequest {
        self.request
    }

    /// Shortcut for [`ConnectionRequest::query_param`].
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.request.query_param(key)
    }

    /// Shortcut for [`ConnectionRequest::header`].
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// Shortcut for [`ConnectionRequest::cookie`].
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.request.cookie(name)
    }

    /// Binds `key` to `value` as part of the connection's identity.
    pub fn identified_by(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.identifiers.insert(key, value.into());
    }

    /// Identity bound so far.
    #[must_use]
    pub fn identifiers(&self) -> &ConnectionIdentifiers {
        &self.identifiers
    }

    /// Connection-level state.
    #[must_use]
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Mutable connection-level state.
    pub fn state_mut(&mut self) -> &mut ChannelState {
        &mut self.state
    }

    /// Queues a frame for this client only.
    pub fn transmit(&mut self, message: impl Into<ServerMessage>) {
        self.transmissions.push(message.into());
    }

    pub(crate) fn into_parts(self) -> (ConnectionIdentifiers, ChannelState, Vec<ServerMessage>) {
        (self.identifiers, self.state, self.transmissions)
    }
}
