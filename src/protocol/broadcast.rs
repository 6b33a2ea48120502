//! Broadcast payloads exchanged between publishers and the gateway.
//!
//! The same JSON body is posted to `POST /_broadcast` by the HTTP adapter
//! and dispatched in-process by the local adapter:
//!
//! ```json
//! {"stream": "chat", "data": "hello"}
//! {"command": "disconnect", "payload": {"identifiers": {"user": "alice"}}}
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::identifier::ConnectionIdentifiers;
use crate::error::CableError;

/// Body of a broadcast: either a stream message or a remote command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum BroadcastPayload {
    /// A command addressed to live connections.
    Command(RemoteCommand),
    /// A message for every subscription following a stream.
    Stream(StreamBroadcast),
}

impl BroadcastPayload {
    /// Builds a stream payload.
    #[must_use]
    pub fn stream(stream: impl Into<String>, data: serde_json::Value) -> Self {
        Self::Stream(StreamBroadcast {
            stream: stream.into(),
            data,
        })
    }

    /// Builds a remote disconnect for every connection bound to
    /// `identifiers`.
    #[must_use]
    pub fn disconnect(identifiers: ConnectionIdentifiers, reconnect: bool) -> Self {
        Self::Command(RemoteCommand::Disconnect(DisconnectPayload {
            identifiers,
            reconnect,
        }))
    }

    /// Checks the payload can be delivered. The stream name is checked but
    /// never rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::InvalidRequest`] if the stream name is blank
    /// or a disconnect names no identifiers.
    pub fn validate(&self) -> Result<(), CableError> {
        match self {
            Self::Stream(msg) if msg.stream.trim().is_empty() => Err(
                CableError::InvalidRequest("stream must not be empty".to_string()),
            ),
            Self::Command(RemoteCommand::Disconnect(cmd)) if cmd.identifiers.is_empty() => Err(
                CableError::InvalidRequest("identifiers must not be empty".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Data published on a named stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StreamBroadcast {
    /// Stream name, e.g. `"chat"`.
    pub stream: String,
    /// Payload delivered verbatim to every subscription on the stream.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// Commands a publisher can send to live connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "command", content = "payload", rename_all = "snake_case")]
pub enum RemoteCommand {
    /// Closes every connection whose identity matches.
    Disconnect(DisconnectPayload),
}

/// Arguments of a remote `disconnect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DisconnectPayload {
    /// Identity to match, e.g. `{"user": "alice"}`. Every pair must be
    /// bound on a connection for it to be closed.
    #[schema(value_type = Object)]
    pub identifiers: ConnectionIdentifiers,
    /// Whether the client may reconnect afterwards.
    #[serde(default = "default_reconnect")]
    pub reconnect: bool,
}

fn default_reconnect() -> bool {
    true
}
