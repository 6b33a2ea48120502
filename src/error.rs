//! Cable error types with HTTP status code mapping.
//!
//! [`CableError`] is the central error type on the server side. Channel
//! and connection handlers return it, command replies carry its message,
//! and the HTTP endpoints map each variant to a status code and a
//! structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: stream must not be empty"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`CableError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status               |
/// |-----------|--------------------|---------------------------|
/// | 1000–1999 | Validation         | 400 Bad Request           |
/// | 2000–2999 | Routing/Not Found  | 404 Not Found             |
/// | 3000–3999 | Server             | 500 Internal Server Error |
/// | 4000–4999 | Authorization      | 401 Unauthorized          |
#[derive(Debug, thiserror::Error)]
pub enum CableError {
    /// The connection handler refused the connection.
    #[error("{0}")]
    Unauthorized(String),

    /// A command referenced a channel that was never registered.
    #[error("missing channel {0:?}")]
    ChannelNotFound(String),

    /// The channel identifier is not a JSON object with a `channel` string.
    #[error("invalid channel identifier: {0}")]
    InvalidIdentifier(String),

    /// The command name is not `subscribe`, `unsubscribe` or `message`.
    #[error("unsupported command {0:?}")]
    UnknownCommand(String),

    /// The channel has no handler for the performed action.
    #[error("missing action {action:?} for channel {channel:?}")]
    UnknownAction {
        /// Action name sent by the client.
        action: String,
        /// Channel name the action was sent to.
        channel: String,
    },

    /// The `data` of a `message` command could not be interpreted.
    #[error("invalid action data: {0}")]
    InvalidData(String),

    /// A typed state update hit a missing key or a value of the wrong type.
    #[error("state error: {0}")]
    State(String),

    /// Request validation failed on an HTTP endpoint.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A broadcast could not be handed to the publishing backend.
    #[error("broadcast failed: {0}")]
    Broadcast(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CableError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidIdentifier(_) => 1002,
            Self::InvalidData(_) => 1003,
            Self::UnknownCommand(_) => 1004,
            Self::Serialization(_) => 1005,
            Self::ChannelNotFound(_) => 2001,
            Self::UnknownAction { .. } => 2002,
            Self::Internal(_) => 3000,
            Self::State(_) => 3001,
            Self::Broadcast(_) => 3002,
            Self::Unauthorized(_) => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidIdentifier(_)
            | Self::InvalidData(_)
            | Self::UnknownCommand(_)
            | Self::Serialization(_) => StatusCode::BAD_REQUEST,
            Self::ChannelNotFound(_) | Self::UnknownAction { .. } => StatusCode::NOT_FOUND,
            Self::State(_) | Self::Broadcast(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for CableError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
