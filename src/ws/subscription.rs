//! Per-connection subscription manager.
//!
//! Tracks which channel subscriptions a WebSocket client holds and which
//! streams each of them follows, and provides server-side broadcast
//! routing.

use std::collections::{BTreeMap, BTreeSet};

use crate::server::CommandReply;

/// Manages the channel subscriptions of a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Streams followed, keyed by channel identifier JSON.
    subscriptions: BTreeMap<String, BTreeSet<String>>,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a confirmed subscription. Idempotent.
    pub fn add(&mut self, identifier: &str) {
        self.subscriptions.entry(identifier.to_string()).or_default();
    }

    /// Drops a subscription and all its streams. Returns `false` if it was
    /// not registered.
    pub fn remove(&mut self, identifier: &str) -> bool {
        self.subscriptions.remove(identifier).is_some()
    }

    /// Returns `true` if `identifier` is a live subscription.
    #[must_use]
    pub fn is_subscribed(&self, identifier: &str) -> bool {
        self.subscriptions.contains_key(identifier)
    }

    /// Applies the stream changes of a successful command reply to a live
    /// subscription. Ignored for unknown identifiers.
    pub fn apply(&mut self, identifier: &str, reply: &CommandReply) {
        let Some(streams) = self.subscriptions.get_mut(identifier) else {
            return;
        };
        if reply.stop_all_streams {
            streams.clear();
        }
        for stream in &reply.streams {
            streams.insert(stream.clone());
        }
        for stream in &reply.stopped_streams {
            streams.remove(stream);
        }
    }

    /// Returns the identifiers of every subscription following `stream`.
    #[must_use]
    pub fn matching(&self, stream: &str) -> Vec<&str> {
        self.subscriptions
            .iter()
            .filter(|(_, streams)| streams.contains(stream))
            .map(|(identifier, _)| identifier.as_str())
            .collect()
    }

    /// Identifiers of all live subscriptions.
    #[must_use]
    pub fn identifiers(&self) -> Vec<String> {
        self.subscriptions.keys().cloned().collect()
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.subscriptions.len()
    }
}
