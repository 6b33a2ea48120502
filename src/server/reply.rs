//! Results of server operations, applied by the WebSocket session.

use std::collections::BTreeMap;

use crate::protocol::{ConnectionIdentifiers, ServerMessage};

/// Outcome of a server operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The handler ran to completion.
    Success,
    /// The handler failed or rejected the request.
    Failure,
}

/// Reply to [`super::CableServer::connect`].
#[derive(Debug, Clone)]
pub struct ConnectReply {
    /// `Success` when the connection is accepted.
    pub status: ReplyStatus,
    /// Identity the connection handler bound.
    pub identifiers: ConnectionIdentifiers,
    /// Frames to send, `welcome` or `disconnect` included.
    pub transmissions: Vec<ServerMessage>,
    /// Connection-state changes.
    pub cstate: BTreeMap<String, String>,
    /// Failure message.
    pub error_msg: Option<String>,
}

impl ConnectReply {
    /// Returns `true` if the connection was accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status == ReplyStatus::Success
    }
}

/// Reply to [`super::CableServer::command`].
#[derive(Debug, Clone)]
pub struct CommandReply {
    /// `Success` when the handler ran to completion.
    pub status: ReplyStatus,
    /// Failure message.
    pub error_msg: Option<String>,
    /// Frames to send to this client.
    pub transmissions: Vec<ServerMessage>,
    /// Streams the subscription started following.
    pub streams: Vec<String>,
    /// Streams the subscription stopped following.
    pub stopped_streams: Vec<String>,
    /// Whether the subscription stopped every stream.
    pub stop_all_streams: bool,
    /// Whether a `subscribe` was rejected by the channel.
    pub rejected: bool,
    /// Connection-state changes.
    pub cstate: BTreeMap<String, String>,
    /// Subscription-state changes.
    pub istate: BTreeMap<String, String>,
}

impl CommandReply {
    pub(crate) fn failure(error_msg: String) -> Self {
        Self {
            status: ReplyStatus::Failure,
            error_msg: Some(error_msg),
            transmissions: Vec::new(),
            streams: Vec::new(),
            stopped_streams: Vec::new(),
            stop_all_streams: false,
            rejected: false,
            cstate: BTreeMap::new(),
            istate: BTreeMap::new(),
        }
    }

    pub(crate) fn rejected(transmission: ServerMessage) -> Self {
        Self {
            status: ReplyStatus::Success,
            error_msg: None,
            transmissions: vec![transmission],
            rejected: true,
            ..Self::failure(String::new())
        }
    }

    /// Returns `true` if the handler ran to completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }
}

/// Reply to [`super::CableServer::disconnect`].
#[derive(Debug, Clone)]
pub struct DisconnectReply {
    /// `Failure` if the connection's disconnect hook failed.
    pub status: ReplyStatus,
    /// Failure message.
    pub error_msg: Option<String>,
}
