//! Chat application: user-identified connections and a single
//! `ChatChannel` relaying text over the `chat` stream.

pub mod authorization;

use crate::broadcast::Broadcaster;
use crate::domain::PubSub;
use crate::error::CableError;
use crate::protocol::ActionData;
use crate::server::{CableServer, Channel, ChannelHandler, Connection, ConnectionHandler};

pub use authorization::{USER_PARAM, UserAuthorization};

/// Channel name clients subscribe to.
pub const CHAT_CHANNEL: &str = "ChatChannel";
/// Stream every chat subscription follows.
pub const CHAT_STREAM: &str = "chat";
/// Action clients perform to post a message.
pub const MESSAGE_ACTION: &str = "message";

/// Requires a `user` query parameter and binds it as the identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChatConnection;

impl ConnectionHandler for ChatConnection {
    fn connect(&self, conn: &mut Connection<'_>) -> Result<(), CableError> {
        match UserAuthorization::default().authorize(conn.request()) {
            UserAuthorization::Identified(user) => {
                conn.identified_by(USER_PARAM, user);
                Ok(())
            }
            _ => Err(CableError::Unauthorized("unauthorized".to_string())),
        }
    }

    fn disconnect(&self, conn: &mut Connection<'_>) -> Result<(), CableError> {
        tracing::debug!(user = ?conn.identifiers().get(USER_PARAM), "chat user left");
        Ok(())
    }
}

/// Relays `message` actions to everyone on the `chat` stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChatChannel;

impl ChannelHandler for ChatChannel {
    fn subscribed(&self, _conn: &mut Connection<'_>, ch: &mut Channel) -> Result<(), CableError> {
        ch.stream_from(CHAT_STREAM);
        Ok(())
    }

    fn perform(
        &self,
        _conn: &mut Connection<'_>,
        ch: &mut Channel,
        action: &str,
        data: &ActionData,
    ) -> Result<(), CableError> {
        if action != MESSAGE_ACTION {
            return Err(CableError::UnknownAction {
                action: action.to_string(),
                channel: ch.name().to_string(),
            });
        }
        let text = data.get("text").cloned().unwrap_or(serde_json::Value::Null);
        let delivered = ch.broadcast(CHAT_STREAM, text)?;
        tracing::debug!(delivered, "chat message relayed");
        Ok(())
    }
}

/// Builds the chat server on top of `pubsub`, broadcasting locally.
#[must_use]
pub fn build_server(pubsub: PubSub) -> CableServer {
    let broadcaster = Broadcaster::local(pubsub.clone());
    build_server_with(pubsub, broadcaster)
}

/// Builds the chat server with sessions on `pubsub` and chat messages
/// published through `broadcaster`.
#[must_use]
pub fn build_server_with(pubsub: PubSub, broadcaster: Broadcaster) -> CableServer {
    CableServer::builder()
        .connection(ChatConnection)
        .channel(CHAT_CHANNEL, ChatChannel)
        .broadcaster(broadcaster)
        .build(pubsub)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{BusEvent, ConnectionRequest};
    use crate::protocol::{ChannelIdentifier, CommandMessage, ControlMessage, ServerMessage};
    use crate::server::SessionEnv;
    use serde_json::json;

    fn env(url: &str) -> SessionEnv {
        let Ok(req) = ConnectionRequest::from_url(url) else {
            panic!("valid url");
        };
        SessionEnv::new(req)
    }

    #[test]
    fn connection_without_user_is_rejected() {
        let server = build_server(PubSub::new(8));
        let reply = server.connect(&env("/cable"));
        assert!(!reply.is_accepted());
        assert_eq!(
            reply.transmissions,
            vec![ServerMessage::Control(ControlMessage::Disconnect {
                reason: "unauthorized".to_string(),
                reconnect: false,
            })]
        );
    }

    #[test]
    fn connection_with_user_binds_identity() {
        let server = build_server(PubSub::new(8));
        let reply = server.connect(&env("/cable?user=alice"));
        assert!(reply.is_accepted());
        assert_eq!(reply.identifiers.get(USER_PARAM), Some(&json!("alice")));
    }

    #[test]
    fn subscribe_streams_from_chat() {
        let server = build_server(PubSub::new(8));
        let identifier = ChannelIdentifier::for_channel(CHAT_CHANNEL);
        let reply = server.command(&env("/cable?user=alice"), &CommandMessage::subscribe(identifier));
        assert!(reply.is_success());
        assert_eq!(reply.streams, vec![CHAT_STREAM.to_string()]);
    }

    #[tokio::test]
    async fn message_action_broadcasts_text() {
        let pubsub = PubSub::new(8);
        let mut rx = pubsub.subscribe();
        let server = build_server(pubsub);

        let mut data = ActionData::new();
        data.insert("text".to_string(), json!("hello"));
        let Ok(cmd) = CommandMessage::perform(
            ChannelIdentifier::for_channel(CHAT_CHANNEL),
            MESSAGE_ACTION,
            data,
        ) else {
            panic!("encoding failed");
        };
        let reply = server.command(&env("/cable?user=alice"), &cmd);
        assert!(reply.is_success());

        let Ok(BusEvent::Stream(message)) = rx.recv().await else {
            panic!("expected broadcast");
        };
        assert_eq!(message.stream, CHAT_STREAM);
        assert_eq!(message.data, json!("hello"));
    }

    #[test]
    fn messages_go_through_the_configured_broadcaster() {
        let local = PubSub::new(8);
        let mut local_rx = local.subscribe();
        let remote = PubSub::new(8);
        let mut remote_rx = remote.subscribe();
        let server = build_server_with(local, Broadcaster::local(remote));

        let mut data = ActionData::new();
        data.insert("text".to_string(), json!("relayed"));
        let Ok(cmd) = CommandMessage::perform(
            ChannelIdentifier::for_channel(CHAT_CHANNEL),
            MESSAGE_ACTION,
            data,
        ) else {
            panic!("encoding failed");
        };
        assert!(server.command(&env("/cable?user=alice"), &cmd).is_success());

        let Ok(BusEvent::Stream(message)) = remote_rx.try_recv() else {
            panic!("expected broadcast on the configured bus");
        };
        assert_eq!(message.data, json!("relayed"));
        assert!(local_rx.try_recv().is_err());
    }

    #[test]
    fn other_actions_are_unknown() {
        let server = build_server(PubSub::new(8));
        let Ok(cmd) = CommandMessage::perform(
            ChannelIdentifier::for_channel(CHAT_CHANNEL),
            "shout",
            ActionData::new(),
        ) else {
            panic!("encoding failed");
        };
        let reply = server.command(&env("/cable?user=alice"), &cmd);
        assert!(!reply.is_success());
    }
}
