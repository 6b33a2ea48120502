//! Channel context handed to channel handlers.

use crate::broadcast::Broadcaster;
use crate::domain::ChannelState;
use crate::error::CableError;
use crate::protocol::{ChannelIdentifier, ChannelMessage, ServerMessage};

/// One channel subscription as seen by a handler invocation.
///
/// Stream changes and transmissions are recorded here and applied by the
/// session once the handler returns; broadcasts go straight to the
/// [`Broadcaster`].
#[derive(Debug)]
pub struct Channel {
    identifier: ChannelIdentifier,
    state: ChannelState,
    broadcaster: Broadcaster,
    streams: Vec<String>,
    stopped_streams: Vec<String>,
    stop_all: bool,
    rejected: bool,
    transmissions: Vec<ServerMessage>,
}

/// What a handler invocation did to a subscription.
#[derive(Debug, Default)]
pub(crate) struct ChannelEffects {
    pub streams: Vec<String>,
    pub stopped_streams: Vec<String>,
    pub stop_all: bool,
    pub rejected: bool,
    pub state: ChannelState,
    pub transmissions: Vec<ServerMessage>,
}

impl Channel {
    pub(crate) fn new(
        identifier: ChannelIdentifier,
        state: ChannelState,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            identifier,
            state,
            broadcaster,
            streams: Vec::new(),
            stopped_streams: Vec::new(),
            stop_all: false,
            rejected: false,
            transmissions: Vec::new(),
        }
    }

    /// The parsed identifier of this subscription.
    #[must_use]
    pub fn identifier(&self) -> &ChannelIdentifier {
        &self.identifier
    }

    /// Channel name, e.g. `"ChatChannel"`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.identifier.channel()
    }

    /// Subscription param `key`.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.identifier.param(key)
    }

    /// Starts forwarding broadcasts on `stream` to this subscription.
    pub fn stream_from(&mut self, stream: impl Into<String>) {
        self.streams.push(stream.into());
    }

    /// Stops forwarding broadcasts on `stream`.
    pub fn stop_stream_from(&mut self, stream: impl Into<String>) {
        self.stopped_streams.push(stream.into());
    }

    /// Stops every stream this subscription follows.
    pub fn stop_all_streams(&mut self) {
        self.stop_all = true;
    }

    /// Publishes `data` to every subscription streaming from `stream`.
    ///
    /// Returns the number of local sessions the message reached.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::InvalidRequest`] for a blank stream name and
    /// [`CableError::Broadcast`] if the backend refuses the message.
    pub fn broadcast(&self, stream: &str, data: serde_json::Value) -> Result<usize, CableError> {
        self.broadcaster.broadcast(stream, data)
    }

    /// Sends `message` to this subscription only.
    pub fn transmit(&mut self, message: serde_json::Value) {
        self.transmissions.push(ServerMessage::Message(ChannelMessage {
            identifier: self.identifier.raw().to_string(),
            message,
        }));
    }

    /// Refuses the subscription. Only meaningful while subscribing.
    pub fn reject(&mut self) {
        self.rejected = true;
    }

    /// Returns `true` if [`Channel::reject`] was called.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    /// Per-subscription state.
    #[must_use]
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Mutable per-subscription state.
    pub fn state_mut(&mut self) -> &mut ChannelState {
        &mut self.state
    }

    pub(crate) fn into_effects(self) -> ChannelEffects {
        ChannelEffects {
            streams: self.streams,
            stopped_streams: self.stopped_streams,
            stop_all: self.stop_all,
            rejected: self.rejected,
            state: self.state,
            transmissions: self.transmissions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::PubSub;
    use serde_json::json;

    fn chat_channel(pubsub: PubSub) -> Channel {
        let Ok(id) = ChannelIdentifier::parse(r#"{"channel":"ChatChannel","room":"lobby"}"#) else {
            panic!("valid identifier");
        };
        Channel::new(id, ChannelState::new(), Broadcaster::local(pubsub))
    }

    #[test]
    fn records_stream_changes() {
        let mut ch = chat_channel(PubSub::new(8));
        ch.stream_from("a");
        ch.stream_from("b");
        ch.stop_stream_from("a");
        let effects = ch.into_effects();
        assert_eq!(effects.streams, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(effects.stopped_streams, vec!["a".to_string()]);
        assert!(!effects.stop_all);
    }

    #[test]
    fn transmit_addresses_own_identifier() {
        let mut ch = chat_channel(PubSub::new(8));
        ch.transmit(json!("tock"));
        let effects = ch.into_effects();
        let Some(ServerMessage::Message(msg)) = effects.transmissions.first() else {
            panic!("expected channel message");
        };
        assert_eq!(msg.identifier, r#"{"channel":"ChatChannel","room":"lobby"}"#);
        assert_eq!(msg.message, json!("tock"));
    }

    #[test]
    fn broadcast_reaches_bus() {
        let pubsub = PubSub::new(8);
        let _rx = pubsub.subscribe();
        let ch = chat_channel(pubsub);
        assert!(matches!(ch.broadcast("chat", json!("hi")), Ok(1)));
    }

    #[test]
    fn param_reads_identifier() {
        let ch = chat_channel(PubSub::new(8));
        assert_eq!(ch.name(), "ChatChannel");
        assert_eq!(ch.param("room"), Some(&json!("lobby")));
    }
}
