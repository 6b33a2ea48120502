//! Subscription callbacks and the chat channel's implementation of them.

use serde_json::Value;

use super::consumer::SubscriptionHandle;
use super::error::ClientError;
use super::page::{MessagesContainer, render_message};
use crate::chat::MESSAGE_ACTION;
use crate::protocol::ActionData;

/// Callbacks a channel subscription reacts to.
pub trait SubscriptionHooks {
    /// The server confirmed the subscription.
    fn connected(&mut self);

    /// A payload arrived on the subscription.
    fn received(&mut self, payload: &Value);

    /// Sends `text` to the channel's `message` action.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if the command cannot be queued.
    fn post_message(&mut self, text: &str) -> Result<(), ClientError>;
}

/// Subscription to `ChatChannel`, rendering into the messages container.
#[derive(Debug)]
pub struct ChatSubscription {
    handle: SubscriptionHandle,
    container: MessagesContainer,
    confirmed: bool,
}

impl ChatSubscription {
    /// Wraps `handle`, starting with a hidden, empty container.
    #[must_use]
    pub fn new(handle: SubscriptionHandle) -> Self {
        Self {
            handle,
            container: MessagesContainer::new(),
            confirmed: false,
        }
    }

    /// The subscription handle.
    #[must_use]
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// The messages container.
    #[must_use]
    pub fn container(&self) -> &MessagesContainer {
        &self.container
    }

    /// Whether the server has confirmed the subscription.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}

impl SubscriptionHooks for ChatSubscription {
    fn connected(&mut self) {
        self.confirmed = true;
        tracing::info!(identifier = %self.handle.identifier(), "connected to chat channel");
    }

    fn received(&mut self, payload: &Value) {
        self.container.show();
        self.container.append(render_message(payload));
    }

    fn post_message(&mut self, text: &str) -> Result<(), ClientError> {
        let mut data = ActionData::new();
        data.insert("text".to_string(), Value::String(text.to_string()));
        self.handle.perform(MESSAGE_ACTION, data)
    }
}
