//! Client-side connection handle and subscription handles.
//!
//! The [`Consumer`] never touches the socket. Commands go into an outbox
//! that the transport drains, and inbound frames are handed back to the
//! consumer through [`Consumer::route`].

use std::collections::BTreeSet;

use serde_json::Value;
use tokio::sync::mpsc;

use super::error::ClientError;
use crate::protocol::{ActionData, ChannelIdentifier, CommandMessage, ControlMessage, ServerMessage};

/// What an inbound frame means for this consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The server accepted the connection.
    Welcome,
    /// Server keep-alive.
    Ping,
    /// The server closed the connection.
    Disconnected {
        /// Reason given by the server.
        reason: String,
        /// Whether the server allows reconnecting.
        reconnect: bool,
    },
    /// A subscription was confirmed.
    Confirmed(String),
    /// A subscription was rejected.
    Rejected(String),
    /// A payload for one of our subscriptions.
    Message {
        /// Identifier of the subscription.
        identifier: String,
        /// Channel payload.
        payload: Value,
    },
    /// A frame for a subscription this consumer does not hold.
    Ignored,
}

/// The single connection that all channel subscriptions share.
#[derive(Debug)]
pub struct Consumer {
    url: String,
    outbox: mpsc::UnboundedSender<CommandMessage>,
    subscriptions: BTreeSet<String>,
}

impl Consumer {
    /// Creates a consumer for `url` that writes commands to `outbox`.
    #[must_use]
    pub fn new(url: impl Into<String>, outbox: mpsc::UnboundedSender<CommandMessage>) -> Self {
        Self {
            url: url.into(),
            outbox,
            subscriptions: BTreeSet::new(),
        }
    }

    /// The cable URL this consumer connects to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Subscribes to `channel` and returns the handle for it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AlreadySubscribed`] if a subscription to the
    /// same channel exists, or [`ClientError::Closed`] if the outbox has
    /// been dropped.
    pub fn create_subscription(&mut self, channel: &str) -> Result<SubscriptionHandle, ClientError> {
        let identifier = ChannelIdentifier::for_channel(channel);
        if self.subscriptions.contains(&identifier) {
            return Err(ClientError::AlreadySubscribed(identifier));
        }
        self.outbox
            .send(CommandMessage::subscribe(identifier.as_str()))
            .map_err(|_| ClientError::Closed)?;
        self.subscriptions.insert(identifier.clone());
        tracing::debug!(identifier = %identifier, "subscription requested");

        Ok(SubscriptionHandle {
            identifier,
            outbox: self.outbox.clone(),
        })
    }

    /// Unsubscribes `handle`'s channel.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] if the outbox has been dropped.
    pub fn remove_subscription(&mut self, handle: &SubscriptionHandle) -> Result<(), ClientError> {
        if self.subscriptions.remove(handle.identifier()) {
            self.outbox
                .send(CommandMessage::unsubscribe(handle.identifier()))
                .map_err(|_| ClientError::Closed)?;
        }
        Ok(())
    }

    /// Whether a subscription with `identifier` is held.
    #[must_use]
    pub fn is_subscribed(&self, identifier: &str) -> bool {
        self.subscriptions.contains(identifier)
    }

    /// Classifies an inbound frame.
    ///
    /// A rejected subscription is forgotten so the channel can be
    /// subscribed again.
    pub fn route(&mut self, message: ServerMessage) -> Delivery {
        match message {
            ServerMessage::Control(ControlMessage::Welcome) => Delivery::Welcome,
            ServerMessage::Control(ControlMessage::Ping { .. }) => Delivery::Ping,
            ServerMessage::Control(ControlMessage::Disconnect { reason, reconnect }) => {
                Delivery::Disconnected { reason, reconnect }
            }
            ServerMessage::Control(ControlMessage::ConfirmSubscription { identifier }) => {
                if self.subscriptions.contains(&identifier) {
                    Delivery::Confirmed(identifier)
                } else {
                    Delivery::Ignored
                }
            }
            ServerMessage::Control(ControlMessage::RejectSubscription { identifier }) => {
                if self.subscriptions.remove(&identifier) {
                    Delivery::Rejected(identifier)
                } else {
                    Delivery::Ignored
                }
            }
            ServerMessage::Message(msg) => {
                if self.subscriptions.contains(&msg.identifier) {
                    Delivery::Message {
                        identifier: msg.identifier,
                        payload: msg.message,
                    }
                } else {
                    Delivery::Ignored
                }
            }
        }
    }
}

/// Handle for one channel subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    identifier: String,
    outbox: mpsc::UnboundedSender<CommandMessage>,
}

impl SubscriptionHandle {
    /// Channel identifier JSON.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Performs `action` on the channel with `data`. Fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Serialization`] if the payload cannot be
    /// encoded, or [`ClientError::Closed`] if the outbox has been dropped.
    pub fn perform(&self, action: &str, data: ActionData) -> Result<(), ClientError> {
        let command = CommandMessage::perform(self.identifier.as_str(), action, data)?;
        self.outbox.send(command).map_err(|_| ClientError::Closed)
    }
}
