//! HTTP broadcast endpoint, for publishing from outside a channel.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::BroadcastResponse;
use crate::app_state::AppState;
use crate::broadcast::{BroadcastAdapter, LocalBroadcastAdapter};
use crate::error::{CableError, ErrorResponse};
use crate::protocol::BroadcastPayload;

/// `POST /_broadcast`: publish a payload on a stream, or run a remote
/// command such as `disconnect`.
///
/// # Errors
///
/// Returns [`CableError::InvalidRequest`] if the stream name is blank or a
/// disconnect names no identifiers.
#[utoipa::path(
    post,
    path = "/_broadcast",
    tag = "Broadcast",
    summary = "Broadcast to a stream or run a remote command",
    description = "With `{stream, data}`, publishes `data` on `stream`: every channel subscription following the stream receives it as a channel message. With `{command: \"disconnect\", payload: {identifiers, reconnect}}`, closes every connection bound to those identifiers.",
    request_body = BroadcastPayload,
    responses(
        (status = 202, description = "Broadcast accepted", body = BroadcastResponse),
        (status = 400, description = "Invalid stream or identifiers", body = ErrorResponse),
    )
)]
pub async fn broadcast_handler(
    State(state): State<AppState>,
    Json(req): Json<BroadcastPayload>,
) -> Result<impl IntoResponse, CableError> {
    let kind = match &req {
        BroadcastPayload::Stream(msg) => msg.stream.clone(),
        BroadcastPayload::Command(_) => "disconnect".to_string(),
    };
    let delivered = LocalBroadcastAdapter::new(state.pubsub.clone()).broadcast_raw(req)?;
    tracing::info!(%kind, delivered, "http broadcast");

    Ok((StatusCode::ACCEPTED, Json(BroadcastResponse { delivered })))
}

/// Broadcast route mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/_broadcast", post(broadcast_handler))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::chat;
    use crate::domain::{BusEvent, PubSub};
    use crate::protocol::ConnectionIdentifiers;
    use serde_json::json;

    fn state() -> AppState {
        AppState::new(chat::build_server(PubSub::new(8)), None)
    }

    #[tokio::test]
    async fn blank_stream_is_rejected() {
        let result = broadcast_handler(
            State(state()),
            Json(BroadcastPayload::stream("  ", json!("hi"))),
        )
        .await;
        let Err(err) = result else {
            panic!("expected validation error");
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let state = state();
        let mut rx = state.pubsub.subscribe();
        let result = broadcast_handler(
            State(state.clone()),
            Json(BroadcastPayload::stream("chat", json!({"text": "hi"}))),
        )
        .await;
        let Ok(response) = result else {
            panic!("broadcast failed");
        };
        assert_eq!(response.into_response().status(), StatusCode::ACCEPTED);

        let Ok(BusEvent::Stream(message)) = rx.recv().await else {
            panic!("expected broadcast");
        };
        assert_eq!(message.stream, "chat");
        assert_eq!(message.data, json!({"text": "hi"}));
    }

    #[tokio::test]
    async fn padded_stream_name_is_published_verbatim() {
        let state = state();
        let mut rx = state.pubsub.subscribe();
        let result = broadcast_handler(
            State(state.clone()),
            Json(BroadcastPayload::stream(" chat ", json!(1))),
        )
        .await;
        assert!(result.is_ok());

        let Ok(BusEvent::Stream(message)) = rx.recv().await else {
            panic!("expected broadcast");
        };
        assert_eq!(message.stream, " chat ");
    }

    #[tokio::test]
    async fn disconnect_command_reaches_sessions() {
        let state = state();
        let mut rx = state.pubsub.subscribe();
        let mut ids = ConnectionIdentifiers::new();
        ids.insert("user", json!("alice"));

        let result = broadcast_handler(
            State(state.clone()),
            Json(BroadcastPayload::disconnect(ids.clone(), true)),
        )
        .await;
        let Ok(response) = result else {
            panic!("disconnect failed");
        };
        assert_eq!(response.into_response().status(), StatusCode::ACCEPTED);

        let Ok(BusEvent::Disconnect(cmd)) = rx.recv().await else {
            panic!("expected disconnect");
        };
        assert_eq!(cmd.identifiers, ids);
    }

    #[tokio::test]
    async fn disconnect_without_identifiers_is_rejected() {
        let result = broadcast_handler(
            State(state()),
            Json(BroadcastPayload::disconnect(ConnectionIdentifiers::new(), true)),
        )
        .await;
        let Err(err) = result else {
            panic!("expected validation error");
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
