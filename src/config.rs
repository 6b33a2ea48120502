//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

/// Top-level server configuration.
///
/// Loaded once at startup via [`CableConfig::from_env`].
#[derive(Debug, Clone)]
pub struct CableConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:9000`).
    pub listen_addr: SocketAddr,

    /// Path the WebSocket endpoint is mounted on.
    pub cable_path: String,

    /// Capacity of the pub/sub broadcast channel.
    pub pubsub_capacity: usize,

    /// Whether `POST /_broadcast` is mounted.
    pub broadcast_endpoint_enabled: bool,

    /// Seconds between `ping` frames on each socket (0 = disabled).
    pub ping_interval_secs: u64,

    /// Remote `/_broadcast` URL channel broadcasts are POSTed to. `None`
    /// publishes on the local bus.
    pub broadcast_url: Option<String>,
}

impl Default for CableConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9000)),
            cable_path: "/cable".to_string(),
            pubsub_capacity: 10_000,
            broadcast_endpoint_enabled: true,
            ping_interval_secs: 3,
            broadcast_url: None,
        }
    }
}

impl CableConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let cable_path = std::env::var("CABLE_PATH")
            .ok()
            .map(|p| normalize_path(&p))
            .unwrap_or(defaults.cable_path);

        let pubsub_capacity = parse_env("PUBSUB_CAPACITY", defaults.pubsub_capacity).max(1);
        let broadcast_endpoint_enabled = parse_env_bool(
            "BROADCAST_ENDPOINT_ENABLED",
            defaults.broadcast_endpoint_enabled,
        );
        let ping_interval_secs = parse_env("PING_INTERVAL_SECS", defaults.ping_interval_secs);
        let broadcast_url = std::env::var("BROADCAST_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            listen_addr,
            cable_path,
            pubsub_capacity,
            broadcast_endpoint_enabled,
            ping_interval_secs,
            broadcast_url,
        })
    }

    /// Ping interval as a [`Duration`], `None` when disabled.
    #[must_use]
    pub fn ping_interval(&self) -> Option<Duration> {
        (self.ping_interval_secs > 0).then(|| Duration::from_secs(self.ping_interval_secs))
    }
}

/// Ensures a route path starts with exactly one `/`.
fn normalize_path(raw: &str) -> String {
    format!("/{}", raw.trim().trim_start_matches('/'))
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
