//! Broadcast channel for stream messages and remote commands.
//!
//! [`PubSub`] wraps a [`tokio::sync::broadcast`] channel. Channels publish
//! a [`StreamMessage`] through the bus, and every WebSocket session
//! subscribes to receive them, forwarding only the streams its channel
//! subscriptions follow. Remote disconnects travel on the same bus so each
//! session can check them against its own identity.

use tokio::sync::broadcast;

use crate::protocol::{ConnectionIdentifiers, DisconnectPayload};

/// One broadcast on a named stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMessage {
    /// Stream (broadcasting) name, e.g. `"chat"`.
    pub stream: String,
    /// JSON payload delivered as the `message` of each channel frame.
    pub data: serde_json::Value,
}

impl StreamMessage {
    /// Creates a message for `stream`.
    #[must_use]
    pub fn new(stream: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            stream: stream.into(),
            data,
        }
    }
}

/// Everything that travels on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// Data for the subscriptions following a stream.
    Stream(StreamMessage),
    /// Close the connections whose identity matches.
    Disconnect(DisconnectPayload),
}

/// Broadcast bus for [`BusEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest messages are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct PubSub {
    sender: broadcast::Sender<BusEvent>,
}

impl PubSub {
    /// Creates a new `PubSub` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes `data` on `stream` to all sessions.
    ///
    /// Returns the number of receivers that received the message.
    /// If there are no active receivers, the message is silently dropped.
    pub fn broadcast(&self, stream: &str, data: serde_json::Value) -> usize {
        self.publish(StreamMessage::new(stream, data))
    }

    /// Publishes a prepared message to all sessions.
    pub fn publish(&self, message: StreamMessage) -> usize {
        tracing::debug!(stream = %message.stream, "broadcasting");
        self.send(BusEvent::Stream(message))
    }

    /// Asks every session bound to `identifiers` to close.
    ///
    /// Returns the number of sessions that saw the request, matching or
    /// not.
    pub fn disconnect(&self, identifiers: ConnectionIdentifiers, reconnect: bool) -> usize {
        tracing::debug!(?identifiers, reconnect, "remote disconnect");
        self.send(BusEvent::Disconnect(DisconnectPayload {
            identifiers,
            reconnect,
        }))
    }

    fn send(&self, event: BusEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    ///
    /// Each WebSocket session should call this once on connect.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
