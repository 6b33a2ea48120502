//! WebSocket transport for the client.
//!
//! Opens the socket, spawns a writer that drains the consumer's outbox and
//! a reader that forwards parsed server frames.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;

use super::error::ClientError;
use crate::protocol::{CommandMessage, ServerMessage};
use crate::ws::handler::ACTION_CABLE_PROTOCOL;

/// Capacity of the inbound frame channel.
const INBOUND_CAPACITY: usize = 1000;

/// Connects to `url` and wires the socket to `outbox`.
///
/// The returned receiver yields one [`ServerMessage`] per text frame.
/// Frames that do not parse are skipped. The receiver closes when the
/// server closes the socket; there is no reconnection.
///
/// # Errors
///
/// Returns [`ClientError::Connection`] if the handshake fails.
pub async fn connect(
    url: &str,
    mut outbox: mpsc::UnboundedReceiver<CommandMessage>,
) -> Result<mpsc::Receiver<ServerMessage>, ClientError> {
    let mut request = url.into_client_request()?;
    request.headers_mut().insert(
        SEC_WEBSOCKET_PROTOCOL,
        HeaderValue::from_static(ACTION_CABLE_PROTOCOL),
    );

    let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
    tracing::info!(url = %url, "cable connected");

    let (mut sink, mut source) = ws_stream.split();
    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);

    tokio::spawn(async move {
        while let Some(command) = outbox.recv().await {
            let json = match serde_json::to_string(&command) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode command");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(json.into())).await {
                tracing::warn!(error = %e, "failed to send command");
                break;
            }
        }
        let _ = sink.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerMessage>(text.as_str()) {
                        Ok(msg) => {
                            if inbound_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::debug!(error = %e, "skipping unparseable frame"),
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "cable read failed");
                    break;
                }
                _ => {}
            }
        }
        tracing::info!("cable closed");
    });

    Ok(inbound_rx)
}
