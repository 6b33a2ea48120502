//! cable-gateway server entry point.
//!
//! Starts the Axum HTTP server with the chat channel behind the
//! WebSocket endpoint.

use tracing_subscriber::EnvFilter;

use cable_gateway::app::build_app;
use cable_gateway::app_state::AppState;
use cable_gateway::broadcast::{Broadcaster, HttpBroadcastAdapter};
use cable_gateway::chat;
use cable_gateway::config::CableConfig;
use cable_gateway::domain::PubSub;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = CableConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        cable_path = %config.cable_path,
        "starting cable-gateway"
    );

    // Build channel framework
    let pubsub = PubSub::new(config.pubsub_capacity);
    let broadcaster = match &config.broadcast_url {
        Some(url) => {
            tracing::info!(url = %url, "broadcasting over http");
            Broadcaster::new(HttpBroadcastAdapter::new(url.as_str())?)
        }
        None => Broadcaster::local(pubsub.clone()),
    };
    let server = chat::build_server_with(pubsub, broadcaster);

    // Build application state and router
    let app_state = AppState::new(server, config.ping_interval());
    let app = build_app(app_state, &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
