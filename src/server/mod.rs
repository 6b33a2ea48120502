//! Channel framework: connection and channel handlers behind an
//! Action Cable compatible command surface.
//!
//! [`CableServer`] exposes three operations, `connect`, `command` and
//! `disconnect`. Each takes the session's [`SessionEnv`], rebuilds the
//! [`Connection`] / [`Channel`] contexts, runs the registered handler and
//! returns a reply describing frames to send, stream changes and state
//! deltas. The server keeps no per-connection state of its own; the
//! WebSocket session owns it and applies the replies.

pub mod channel;
pub mod connection;
pub mod env;
pub mod handler;
pub mod reply;

use std::collections::HashMap;
use std::sync::Arc;

pub use channel::Channel;
pub use connection::Connection;
pub use env::SessionEnv;
pub use handler::{AcceptAll, ChannelHandler, ConnectionHandler};
pub use reply::{CommandReply, ConnectReply, DisconnectReply, ReplyStatus};

use crate::broadcast::Broadcaster;
use crate::domain::{ChannelState, PubSub};
use crate::error::CableError;
use crate::protocol::messages::{MESSAGE, SUBSCRIBE, UNSUBSCRIBE};
use crate::protocol::{
    ActionData, ChannelIdentifier, CommandMessage, ConnectionIdentifiers, ControlMessage,
};

/// Reason sent with `disconnect` when the connection handler fails with
/// something other than [`CableError::Unauthorized`].
const SERVER_ERROR_REASON: &str = "server_error";

/// Command kinds accepted from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Subscribe,
    Unsubscribe,
    Message,
}

impl Command {
    fn parse(name: &str) -> Result<Self, CableError> {
        match name {
            SUBSCRIBE => Ok(Self::Subscribe),
            UNSUBSCRIBE => Ok(Self::Unsubscribe),
            MESSAGE => Ok(Self::Message),
            other => Err(CableError::UnknownCommand(other.to_string())),
        }
    }
}

/// Registry of handlers plus the bus sessions listen on and the
/// broadcaster channels publish through.
///
/// Immutable once built; share it behind an [`Arc`].
#[derive(Debug)]
pub struct CableServer {
    connection: Arc<dyn ConnectionHandler>,
    channels: HashMap<String, Arc<dyn ChannelHandler>>,
    pubsub: PubSub,
    broadcaster: Broadcaster,
}

impl CableServer {
    /// Starts building a server.
    #[must_use]
    pub fn builder() -> CableServerBuilder {
        CableServerBuilder::default()
    }

    /// The bus channels broadcast on.
    #[must_use]
    pub fn pubsub(&self) -> &PubSub {
        &self.pubsub
    }

    /// Runs the connection handler for a freshly opened socket.
    ///
    /// On success the reply starts with `welcome`. On failure it carries a
    /// single `disconnect` frame with `reconnect: false`.
    pub fn connect(&self, env: &SessionEnv) -> ConnectReply {
        match self.try_connect(env) {
            Ok(reply) => {
                tracing::info!(
                    path = %env.request.uri().path(),
                    identifiers = ?reply.identifiers,
                    "connection accepted"
                );
                reply
            }
            Err(err) => {
                tracing::info!(path = %env.request.uri().path(), reason = %err, "connection rejected");
                let reason = match &err {
                    CableError::Unauthorized(reason) => reason.clone(),
                    _ => SERVER_ERROR_REASON.to_string(),
                };
                ConnectReply {
                    status: ReplyStatus::Failure,
                    identifiers: ConnectionIdentifiers::new(),
                    transmissions: vec![
                        ControlMessage::Disconnect {
                            reason,
                            reconnect: false,
                        }
                        .into(),
                    ],
                    cstate: Default::default(),
                    error_msg: Some(err.to_string()),
                }
            }
        }
    }

    fn try_connect(&self, env: &SessionEnv) -> Result<ConnectReply, CableError> {
        let state = ChannelState::decode(&env.cstate)?;
        let mut conn = Connection::new(&env.request, ConnectionIdentifiers::new(), state);
        self.connection.connect(&mut conn)?;

        let (identifiers, state, handler_transmissions) = conn.into_parts();
        let mut transmissions = Vec::with_capacity(handler_transmissions.len() + 1);
        transmissions.push(ControlMessage::Welcome.into());
        transmissions.extend(handler_transmissions);

        Ok(ConnectReply {
            status: ReplyStatus::Success,
            identifiers,
            transmissions,
            cstate: state.changes()?,
            error_msg: None,
        })
    }

    /// Handles one client command.
    ///
    /// Failures never tear the session down: they come back as a
    /// `Failure` reply with an error message and no frames.
    pub fn command(&self, env: &SessionEnv, msg: &CommandMessage) -> CommandReply {
        match self.try_command(env, msg) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(
                    command = %msg.command,
                    identifier = %msg.identifier,
                    error = %err,
                    "command failed"
                );
                CommandReply::failure(format!("error handling command {:?}: {err}", msg.command))
            }
        }
    }

    fn try_command(&self, env: &SessionEnv, msg: &CommandMessage) -> Result<CommandReply, CableError> {
        let command = Command::parse(&msg.command)?;
        let identifier = ChannelIdentifier::parse(&msg.identifier)?;
        let handler = self
            .channels
            .get(identifier.channel())
            .ok_or_else(|| CableError::ChannelNotFound(identifier.channel().to_string()))?;

        let cstate = ChannelState::decode(&env.cstate)?;
        let istate = match env.istates.get(&msg.identifier) {
            Some(encoded) => ChannelState::decode(encoded)?,
            None => ChannelState::new(),
        };
        let mut conn = Connection::new(&env.request, env.identifiers.clone(), cstate);
        let mut ch = Channel::new(identifier, istate, self.broadcaster.clone());

        match command {
            Command::Subscribe => handler.subscribed(&mut conn, &mut ch)?,
            Command::Unsubscribe => {
                handler.unsubscribed(&mut conn, &mut ch)?;
                ch.stop_all_streams();
            }
            Command::Message => {
                let data = parse_action_data(msg.data.as_deref())?;
                match data.get("action") {
                    None => {}
                    Some(serde_json::Value::String(action)) => {
                        handler.perform(&mut conn, &mut ch, action, &data)?;
                    }
                    Some(other) => {
                        return Err(CableError::InvalidData(format!(
                            "expecting action to be a string, got: {other}"
                        )));
                    }
                }
            }
        }

        let (_, cstate, conn_transmissions) = conn.into_parts();
        let effects = ch.into_effects();

        if command == Command::Subscribe && effects.rejected {
            tracing::info!(identifier = %msg.identifier, "subscription rejected");
            return Ok(CommandReply::rejected(
                ControlMessage::RejectSubscription {
                    identifier: msg.identifier.clone(),
                }
                .into(),
            ));
        }

        let mut transmissions = Vec::new();
        if command == Command::Subscribe {
            transmissions.push(
                ControlMessage::ConfirmSubscription {
                    identifier: msg.identifier.clone(),
                }
                .into(),
            );
        }
        transmissions.extend(conn_transmissions);
        transmissions.extend(effects.transmissions);

        Ok(CommandReply {
            status: ReplyStatus::Success,
            error_msg: None,
            transmissions,
            streams: effects.streams,
            stopped_streams: effects.stopped_streams,
            stop_all_streams: effects.stop_all,
            rejected: false,
            cstate: cstate.changes()?,
            istate: effects.state.changes()?,
        })
    }

    /// Tears down a closed connection: runs `unsubscribed` for each live
    /// subscription, then the connection's `disconnect` hook.
    ///
    /// A failing channel is logged and skipped so the others still run.
    pub fn disconnect(&self, env: &SessionEnv, subscriptions: &[String]) -> DisconnectReply {
        let cstate = ChannelState::decode(&env.cstate).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "discarding undecodable connection state");
            ChannelState::new()
        });
        let mut conn = Connection::new(&env.request, env.identifiers.clone(), cstate);

        for raw in subscriptions {
            if let Err(err) = self.unsubscribe_on_close(&mut conn, env, raw) {
                tracing::error!(identifier = %raw, error = %err, "error unsubscribing on disconnect");
            }
        }

        match self.connection.disconnect(&mut conn) {
            Ok(()) => {
                tracing::debug!(identifiers = ?env.identifiers, "connection disconnected");
                DisconnectReply {
                    status: ReplyStatus::Success,
                    error_msg: None,
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "disconnect handler failed");
                DisconnectReply {
                    status: ReplyStatus::Failure,
                    error_msg: Some(format!("error handling disconnect: {err}")),
                }
            }
        }
    }

    fn unsubscribe_on_close(
        &self,
        conn: &mut Connection<'_>,
        env: &SessionEnv,
        raw: &str,
    ) -> Result<(), CableError> {
        let identifier = ChannelIdentifier::parse(raw)?;
        let handler = self
            .channels
            .get(identifier.channel())
            .ok_or_else(|| CableError::ChannelNotFound(identifier.channel().to_string()))?;
        let istate = match env.istates.get(raw) {
            Some(encoded) => ChannelState::decode(encoded)?,
            None => ChannelState::new(),
        };
        let mut ch = Channel::new(identifier, istate, self.broadcaster.clone());
        handler.unsubscribed(conn, &mut ch)
    }
}

/// Decodes the `data` of a `message` command into a JSON object.
fn parse_action_data(data: Option<&str>) -> Result<ActionData, CableError> {
    let Some(raw) = data else {
        return Ok(ActionData::new());
    };
    serde_json::from_str(raw).map_err(|e| CableError::InvalidData(format!("{raw}: {e}")))
}

/// Builder for [`CableServer`].
#[derive(Debug, Default)]
pub struct CableServerBuilder {
    connection: Option<Arc<dyn ConnectionHandler>>,
    channels: HashMap<String, Arc<dyn ChannelHandler>>,
    broadcaster: Option<Broadcaster>,
}

impl CableServerBuilder {
    /// Sets the connection handler. Defaults to [`AcceptAll`].
    #[must_use]
    pub fn connection(mut self, handler: impl ConnectionHandler + 'static) -> Self {
        self.connection = Some(Arc::new(handler));
        self
    }

    /// Registers `handler` for the channel `name`, replacing any earlier
    /// registration.
    #[must_use]
    pub fn channel(mut self, name: impl Into<String>, handler: impl ChannelHandler + 'static) -> Self {
        self.channels.insert(name.into(), Arc::new(handler));
        self
    }

    /// Routes channel broadcasts through `broadcaster` instead of the
    /// local bus.
    #[must_use]
    pub fn broadcaster(mut self, broadcaster: Broadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Finishes the server. Sessions listen on `pubsub`; channel
    /// broadcasts go to it too unless a broadcaster was set.
    #[must_use]
    pub fn build(self, pubsub: PubSub) -> CableServer {
        let broadcaster = self
            .broadcaster
            .unwrap_or_else(|| Broadcaster::local(pubsub.clone()));
        CableServer {
            connection: self.connection.unwrap_or_else(|| Arc::new(AcceptAll)),
            channels: self.channels,
            pubsub,
            broadcaster,
        }
    }
}
