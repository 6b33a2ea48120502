//! WebSocket message types: client commands and server transmissions.

use serde::{Deserialize, Serialize};

/// Payload of a `message` command once decoded: a JSON object carrying an
/// `action` name plus arbitrary fields.
pub type ActionData = serde_json::Map<String, serde_json::Value>;

/// Command name for subscribing to a channel.
pub const SUBSCRIBE: &str = "subscribe";
/// Command name for leaving a channel.
pub const UNSUBSCRIBE: &str = "unsubscribe";
/// Command name for performing an action on a channel.
pub const MESSAGE: &str = "message";

/// Client → Server command frame.
///
/// `identifier` and `data` are JSON documents encoded as strings, the way
/// Action Cable clients send them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    /// `subscribe`, `unsubscribe` or `message`.
    pub command: String,
    /// Channel identifier JSON, e.g. `{"channel":"ChatChannel"}`.
    pub identifier: String,
    /// Action payload JSON for `message` commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl CommandMessage {
    /// Builds a `subscribe` command for the given identifier.
    #[must_use]
    pub fn subscribe(identifier: impl Into<String>) -> Self {
        Self {
            command: SUBSCRIBE.to_string(),
            identifier: identifier.into(),
            data: None,
        }
    }

    /// Builds an `unsubscribe` command for the given identifier.
    #[must_use]
    pub fn unsubscribe(identifier: impl Into<String>) -> Self {
        Self {
            command: UNSUBSCRIBE.to_string(),
            identifier: identifier.into(),
            data: None,
        }
    }

    /// Builds a `message` command performing `action` with `data`.
    ///
    /// The `action` key is inserted into `data` before encoding.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if the payload cannot be encoded.
    pub fn perform(
        identifier: impl Into<String>,
        action: &str,
        mut data: ActionData,
    ) -> Result<Self, serde_json::Error> {
        data.insert(
            "action".to_string(),
            serde_json::Value::String(action.to_string()),
        );
        Ok(Self {
            command: MESSAGE.to_string(),
            identifier: identifier.into(),
            data: Some(serde_json::to_string(&data)?),
        })
    }
}

/// Protocol-level transmissions discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Sent once after the connection is accepted.
    Welcome,
    /// Keep-alive carrying a Unix timestamp.
    Ping {
        /// Seconds since the Unix epoch.
        message: i64,
    },
    /// The server refuses or ends the connection.
    Disconnect {
        /// Machine-readable reason (e.g. `"unauthorized"`).
        reason: String,
        /// Whether the client should try to reconnect.
        reconnect: bool,
    },
    /// The subscription identified by `identifier` is active.
    ConfirmSubscription {
        /// Channel identifier JSON.
        identifier: String,
    },
    /// The channel refused the subscription.
    RejectSubscription {
        /// Channel identifier JSON.
        identifier: String,
    },
}

/// A payload addressed to one channel subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Channel identifier JSON the payload belongs to.
    pub identifier: String,
    /// Arbitrary JSON payload.
    pub message: serde_json::Value,
}

/// Server → Client frame.
///
/// Control frames carry a `type`; channel messages do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerMessage {
    /// A typed protocol frame.
    Control(ControlMessage),
    /// A channel payload.
    Message(ChannelMessage),
}

impl From<ControlMessage> for ServerMessage {
    fn from(msg: ControlMessage) -> Self {
        Self::Control(msg)
    }
}

impl From<ChannelMessage> for ServerMessage {
    fn from(msg: ChannelMessage) -> Self {
        Self::Message(msg)
    }
}
