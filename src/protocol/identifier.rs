//! Channel and connection identifiers.
//!
//! A [`ChannelIdentifier`] is the JSON document a client subscribes with,
//! e.g. `{"channel":"ChatChannel","room":"lobby"}`. The raw string is kept
//! verbatim because it is also the key the client uses to route replies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CableError;

/// Parsed channel identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelIdentifier {
    channel: String,
    params: serde_json::Map<String, serde_json::Value>,
    raw: String,
}

impl ChannelIdentifier {
    /// Parses an identifier JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::InvalidIdentifier`] if `raw` is not a JSON
    /// object or lacks a string `channel` key.
    pub fn parse(raw: &str) -> Result<Self, CableError> {
        let params: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
            .map_err(|e| CableError::InvalidIdentifier(format!("{raw}: {e}")))?;
        let channel = params
            .get("channel")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CableError::InvalidIdentifier(format!("missing \"channel\" in {raw}")))?
            .to_string();
        Ok(Self {
            channel,
            params,
            raw: raw.to_string(),
        })
    }

    /// Builds the identifier JSON a client uses to subscribe to `channel`
    /// without extra params.
    #[must_use]
    pub fn for_channel(channel: &str) -> String {
        serde_json::json!({ "channel": channel }).to_string()
    }

    /// Channel name, e.g. `"ChatChannel"`.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns a subscription param (the `channel` key included).
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    /// All params, the `channel` key included.
    #[must_use]
    pub fn params(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.params
    }

    /// The identifier exactly as the client sent it.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Values a connection handler bound to the connection via
/// `identified_by`, e.g. `{"user": "alice"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionIdentifiers(BTreeMap<String, serde_json::Value>);

impl ConnectionIdentifiers {
    /// Creates an empty identifier set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to `value`, replacing any earlier binding.
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    /// Returns the value bound to `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Returns `true` if nothing has been bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if every pair in `selector` is bound to the same
    /// value here. An empty selector matches nothing.
    #[must_use]
    pub fn matches(&self, selector: &ConnectionIdentifiers) -> bool {
        !selector.is_empty()
            && selector
                .0
                .iter()
                .all(|(key, value)| self.0.get(key) == Some(value))
    }
}
