//! WebSocket session loop.
//!
//! Handles the read/write loop for a single WebSocket connection:
//! runs the connect handshake, dispatches client commands to the
//! [`CableServer`], forwards broadcasts to the subscriptions that stream
//! from them, honours remote disconnects, and tears the connection down on
//! close.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::subscription::SubscriptionManager;
use crate::domain::{BusEvent, ConnectionRequest, StreamMessage};
use crate::protocol::messages::{SUBSCRIBE, UNSUBSCRIBE};
use crate::protocol::{
    ChannelMessage, CommandMessage, ControlMessage, DisconnectPayload, ServerMessage,
};
use crate::server::{CableServer, SessionEnv};

type WsSink = SplitSink<WebSocket, Message>;

/// Reason sent with `disconnect` when a publisher closes the connection.
const REMOTE_REASON: &str = "remote";

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Sends the connect reply; closes the socket if the connection is
///   rejected.
/// - Reads commands from the client and dispatches them.
/// - Forwards matching broadcasts from the pub/sub bus to the client.
/// - Closes the socket when a remote disconnect matches its identity.
/// - Sends a `ping` every `ping_interval`, if set.
pub async fn run_connection(
    socket: WebSocket,
    server: Arc<CableServer>,
    request: ConnectionRequest,
    ping_interval: Option<Duration>,
) {
    let session_id = uuid::Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut env = SessionEnv::new(request);

    // Subscribe before connecting so no broadcast is missed between a
    // confirmation and the first loop iteration.
    let mut stream_rx = server.pubsub().subscribe();

    let reply = server.connect(&env);
    if send_all(&mut ws_tx, &reply.transmissions).await.is_err() {
        return;
    }
    if !reply.is_accepted() {
        let _ = ws_tx.send(Message::Close(None)).await;
        tracing::debug!(%session_id, "ws connection rejected");
        return;
    }
    env.identifiers = reply.identifiers;
    env.merge_connection_state(&reply.cstate);
    tracing::debug!(%session_id, "ws connection open");

    let mut subs = SubscriptionManager::new();
    let mut ping = ping_interval
        .map(|period| tokio::time::interval_at(tokio::time::Instant::now() + period, period));

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let frames = handle_text_message(&server, &mut env, &mut subs, text.as_str());
                        if send_all(&mut ws_tx, &frames).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%session_id, error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Broadcast from the pub/sub bus
            event = stream_rx.recv() => {
                match event {
                    Ok(BusEvent::Stream(message)) => {
                        let frames = route_broadcast(&subs, &message);
                        if send_all(&mut ws_tx, &frames).await.is_err() {
                            break;
                        }
                    }
                    Ok(BusEvent::Disconnect(cmd)) => {
                        if let Some(frame) = remote_disconnect(&env, &cmd) {
                            tracing::info!(%session_id, identifiers = ?env.identifiers, "remote disconnect");
                            let _ = send_all(&mut ws_tx, std::slice::from_ref(&frame)).await;
                            let _ = ws_tx.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%session_id, lagged = n, "ws client lagged behind pubsub");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = next_ping(&mut ping) => {
                let frame = ServerMessage::from(ControlMessage::Ping {
                    message: chrono::Utc::now().timestamp(),
                });
                if send_all(&mut ws_tx, std::slice::from_ref(&frame)).await.is_err() {
                    break;
                }
            }
        }
    }

    let subscriptions = subs.identifiers();
    let reply = server.disconnect(&env, &subscriptions);
    tracing::debug!(
        %session_id,
        subscriptions = subscriptions.len(),
        status = ?reply.status,
        "ws connection closed"
    );
}

/// Resolves on the next ping tick, or never when pings are disabled.
async fn next_ping(ping: &mut Option<tokio::time::Interval>) {
    match ping {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Handles a text frame from the client, returning the frames to send
/// back.
///
/// Malformed frames are logged and dropped, as are `message` and
/// `unsubscribe` commands for identifiers without a live subscription and
/// a `subscribe` for one that is already live.
fn handle_text_message(
    server: &CableServer,
    env: &mut SessionEnv,
    subs: &mut SubscriptionManager,
    text: &str,
) -> Vec<ServerMessage> {
    let msg = match serde_json::from_str::<CommandMessage>(text) {
        Ok(msg) => msg,
        Err(err) => {
            tracing::warn!(error = %err, "malformed command frame");
            return Vec::new();
        }
    };

    let live = subs.is_subscribed(&msg.identifier);
    if msg.command == SUBSCRIBE && live {
        tracing::warn!(identifier = %msg.identifier, "already subscribed");
        return Vec::new();
    }
    if msg.command != SUBSCRIBE && !live {
        tracing::warn!(
            command = %msg.command,
            identifier = %msg.identifier,
            "command for a channel the session is not subscribed to"
        );
        return Vec::new();
    }

    let reply = server.command(env, &msg);
    if reply.is_success() && !reply.rejected {
        env.merge_connection_state(&reply.cstate);
        match msg.command.as_str() {
            SUBSCRIBE => subs.add(&msg.identifier),
            UNSUBSCRIBE => {
                subs.remove(&msg.identifier);
                env.remove_channel_state(&msg.identifier);
            }
            _ => {}
        }
        if subs.is_subscribed(&msg.identifier) {
            subs.apply(&msg.identifier, &reply);
            env.merge_channel_state(&msg.identifier, &reply.istate);
        }
    }
    reply.transmissions
}

/// Builds one channel frame per subscription following the broadcast's
/// stream.
fn route_broadcast(subs: &SubscriptionManager, message: &StreamMessage) -> Vec<ServerMessage> {
    subs.matching(&message.stream)
        .into_iter()
        .map(|identifier| {
            ServerMessage::Message(ChannelMessage {
                identifier: identifier.to_string(),
                message: message.data.clone(),
            })
        })
        .collect()
}

/// Returns the `disconnect` frame to send if `cmd` targets this session.
fn remote_disconnect(env: &SessionEnv, cmd: &DisconnectPayload) -> Option<ServerMessage> {
    env.identifiers.matches(&cmd.identifiers).then(|| {
        ServerMessage::from(ControlMessage::Disconnect {
            reason: REMOTE_REASON.to_string(),
            reconnect: cmd.reconnect,
        })
    })
}

/// Serializes and sends frames in order. Frames that fail to serialize
/// are skipped.
async fn send_all(ws_tx: &mut WsSink, frames: &[ServerMessage]) -> Result<(), axum::Error> {
    for frame in frames {
        match serde_json::to_string(frame) {
            Ok(json) => ws_tx.send(Message::text(json)).await?,
            Err(err) => tracing::warn!(error = %err, "dropping unserializable frame"),
        }
    }
    Ok(())
}
