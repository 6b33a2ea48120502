//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::PubSub;
use crate::server::CableServer;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Channel framework all WebSocket sessions dispatch to.
    pub server: Arc<CableServer>,
    /// Bus for broadcasts from the HTTP endpoint and from channels.
    pub pubsub: PubSub,
    /// Interval between `ping` frames; `None` disables them.
    pub ping_interval: Option<Duration>,
}

impl AppState {
    /// Builds state around `server`, sharing its bus.
    #[must_use]
    pub fn new(server: CableServer, ping_interval: Option<Duration>) -> Self {
        let pubsub = server.pubsub().clone();
        Self {
            server: Arc::new(server),
            pubsub,
            ping_interval,
        }
    }
}
