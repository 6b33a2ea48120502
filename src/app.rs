//! Router composition shared by the binary and the integration tests.

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::CableConfig;
use crate::ws::handler::ws_handler;

/// Builds the full application: REST routes, the WebSocket endpoint at
/// `config.cable_path`, tracing and CORS layers.
pub fn build_app(state: AppState, config: &CableConfig) -> Router {
    let router = Router::new()
        .merge(api::build_router(config.broadcast_endpoint_enabled))
        .route(&config.cable_path, get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::chat;
    use crate::domain::PubSub;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tokio_test::assert_ok;
    use tower::ServiceExt;

    fn app(broadcast_endpoint_enabled: bool) -> Router {
        let config = CableConfig {
            broadcast_endpoint_enabled,
            ..CableConfig::default()
        };
        let server = chat::build_server(PubSub::new(config.pubsub_capacity));
        build_app(AppState::new(server, None), &config)
    }

    fn broadcast_request() -> Request<Body> {
        let request = Request::post("/_broadcast")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"stream":"chat","data":"hi"}"#));
        assert_ok!(request)
    }

    #[tokio::test]
    async fn health_is_mounted() {
        let request = assert_ok!(Request::get("/health").body(Body::empty()));
        let response = assert_ok!(app(true).oneshot(request).await);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn broadcast_endpoint_can_be_disabled() {
        let response = assert_ok!(app(false).oneshot(broadcast_request()).await);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn broadcast_endpoint_is_mounted_by_default() {
        let response = assert_ok!(app(true).oneshot(broadcast_request()).await);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
