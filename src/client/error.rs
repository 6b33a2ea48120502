//! Client error types.

use thiserror::Error;

/// Errors raised by the chat client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The page URL could not be turned into a cable URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A subscription with the same identifier already exists.
    #[error("already subscribed: {0}")]
    AlreadySubscribed(String),

    /// A command could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The WebSocket connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The outbox is gone; the connection has shut down.
    #[error("connection closed")]
    Closed,
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connection(err.to_string())
    }
}
