//! REST API layer: route handlers, DTOs, and router composition.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the HTTP endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(handlers::system::health_handler, handlers::broadcast::broadcast_handler),
    components(schemas(
        crate::protocol::BroadcastPayload,
        crate::protocol::StreamBroadcast,
        crate::protocol::RemoteCommand,
        crate::protocol::DisconnectPayload,
        dto::BroadcastResponse,
        handlers::system::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "System", description = "Service health"),
        (name = "Broadcast", description = "Publishing to streams and remote commands"),
    )
)]
pub struct ApiDoc;

/// Builds the REST router. The broadcast endpoint is only mounted when
/// `broadcast_enabled` is set.
pub fn build_router(broadcast_enabled: bool) -> Router<AppState> {
    let router = Router::new().merge(handlers::system::routes());
    if broadcast_enabled {
        router.merge(handlers::broadcast::routes())
    } else {
        router
    }
}
