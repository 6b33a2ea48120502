//! Pluggable publishing backends.
//!
//! Channels and the HTTP endpoint never write to the bus directly; they go
//! through a [`Broadcaster`], which hands a [`BroadcastPayload`] to a
//! [`BroadcastAdapter`]. Two adapters ship with the crate:
//!
//! - [`LocalBroadcastAdapter`] dispatches onto the in-process [`PubSub`].
//! - [`HttpBroadcastAdapter`] POSTs the payload to a remote `/_broadcast`
//!   endpoint, so several gateways can share one publisher.

pub mod http;

use std::fmt;
use std::sync::Arc;

pub use http::HttpBroadcastAdapter;

use crate::domain::{PubSub, StreamMessage};
use crate::error::CableError;
use crate::protocol::{BroadcastPayload, ConnectionIdentifiers, RemoteCommand};

/// Delivers broadcast payloads somewhere.
pub trait BroadcastAdapter: Send + Sync + fmt::Debug {
    /// Delivers `payload`.
    ///
    /// Returns the number of local sessions the payload reached, or `0`
    /// when delivery happens elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::InvalidRequest`] for a payload that fails
    /// validation and [`CableError::Broadcast`] if the backend cannot
    /// accept it.
    fn broadcast_raw(&self, payload: BroadcastPayload) -> Result<usize, CableError>;
}

/// Delivers payloads to the sessions of this process.
#[derive(Debug, Clone)]
pub struct LocalBroadcastAdapter {
    pubsub: PubSub,
}

impl LocalBroadcastAdapter {
    /// Creates an adapter publishing on `pubsub`.
    #[must_use]
    pub fn new(pubsub: PubSub) -> Self {
        Self { pubsub }
    }
}

impl BroadcastAdapter for LocalBroadcastAdapter {
    fn broadcast_raw(&self, payload: BroadcastPayload) -> Result<usize, CableError> {
        payload.validate()?;
        let delivered = match payload {
            BroadcastPayload::Stream(msg) => {
                self.pubsub.publish(StreamMessage::new(msg.stream, msg.data))
            }
            BroadcastPayload::Command(RemoteCommand::Disconnect(cmd)) => {
                self.pubsub.disconnect(cmd.identifiers, cmd.reconnect)
            }
        };
        Ok(delivered)
    }
}

/// Cloneable handle over a shared [`BroadcastAdapter`].
#[derive(Debug, Clone)]
pub struct Broadcaster {
    adapter: Arc<dyn BroadcastAdapter>,
}

impl Broadcaster {
    /// Wraps `adapter`.
    #[must_use]
    pub fn new(adapter: impl BroadcastAdapter + 'static) -> Self {
        Self {
            adapter: Arc::new(adapter),
        }
    }

    /// Broadcaster delivering to the sessions on `pubsub`.
    #[must_use]
    pub fn local(pubsub: PubSub) -> Self {
        Self::new(LocalBroadcastAdapter::new(pubsub))
    }

    /// Publishes `data` on `stream`.
    ///
    /// # Errors
    ///
    /// See [`BroadcastAdapter::broadcast_raw`].
    pub fn broadcast(&self, stream: &str, data: serde_json::Value) -> Result<usize, CableError> {
        self.broadcast_raw(BroadcastPayload::stream(stream, data))
    }

    /// Closes every connection bound to `identifiers`.
    ///
    /// # Errors
    ///
    /// See [`BroadcastAdapter::broadcast_raw`].
    pub fn disconnect(
        &self,
        identifiers: ConnectionIdentifiers,
        reconnect: bool,
    ) -> Result<usize, CableError> {
        self.broadcast_raw(BroadcastPayload::disconnect(identifiers, reconnect))
    }

    /// Hands a prepared payload to the adapter.
    ///
    /// # Errors
    ///
    /// See [`BroadcastAdapter::broadcast_raw`].
    pub fn broadcast_raw(&self, payload: BroadcastPayload) -> Result<usize, CableError> {
        self.adapter.broadcast_raw(payload)
    }
}
