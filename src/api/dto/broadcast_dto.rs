//! DTOs for the HTTP broadcast endpoint.
//!
//! The request body is [`crate::protocol::BroadcastPayload`], shared with
//! the HTTP broadcast adapter.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response body of `POST /_broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BroadcastResponse {
    /// Number of live sessions the broadcast reached.
    pub delivered: usize,
}
