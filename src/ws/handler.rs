//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{HeaderMap, Uri};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::ConnectionRequest;

/// Subprotocol offered by Action Cable clients.
pub const ACTION_CABLE_PROTOCOL: &str = "actioncable-v1-json";

/// `GET /cable`: upgrade the HTTP connection to WebSocket.
///
/// The URI (query included) and headers are captured for the connection
/// handler before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    uri: Uri,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let request = ConnectionRequest::from_parts(uri, &headers);
    let server = Arc::clone(&state.server);
    let ping_interval = state.ping_interval;

    ws.protocols([ACTION_CABLE_PROTOCOL])
        .on_upgrade(move |socket| run_connection(socket, server, request, ping_interval))
}
