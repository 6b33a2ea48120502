//! The chat page: owns the consumer, the chat subscription and the DOM
//! model, and handles page events.

use tokio::sync::mpsc;

use super::consumer::{Consumer, Delivery};
use super::error::ClientError;
use super::page::{ElementId, MessagesContainer, TextInput};
use super::subscription::{ChatSubscription, SubscriptionHooks};
use super::url::{DEFAULT_CABLE_PATH, cable_url};
use crate::chat::CHAT_CHANNEL;
use crate::protocol::{CommandMessage, ServerMessage};

/// Something that happened on the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// The text input's value changed.
    Input(String),
    /// An element was clicked.
    Click(ElementId),
    /// A frame arrived from the server.
    Server(ServerMessage),
}

/// Top-level page state, created once at load.
#[derive(Debug)]
pub struct ChatPage {
    consumer: Consumer,
    subscription: ChatSubscription,
    input: TextInput,
}

impl ChatPage {
    /// Page initialization: builds the cable URL from `page_url`, creates
    /// the consumer and subscribes to the chat channel.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] for a page URL without a host,
    /// or [`ClientError::Closed`] if `outbox` has no receiver.
    pub fn bootstrap(
        page_url: &str,
        outbox: mpsc::UnboundedSender<CommandMessage>,
    ) -> Result<Self, ClientError> {
        let url = cable_url(page_url, DEFAULT_CABLE_PATH)?;
        let mut consumer = Consumer::new(url, outbox);
        let handle = consumer.create_subscription(CHAT_CHANNEL)?;
        tracing::debug!(url = %consumer.url(), "chat page bootstrapped");

        Ok(Self {
            consumer,
            subscription: ChatSubscription::new(handle),
            input: TextInput::default(),
        })
    }

    /// The cable URL the page connects to.
    #[must_use]
    pub fn cable_url(&self) -> &str {
        self.consumer.url()
    }

    /// The messages container.
    #[must_use]
    pub fn container(&self) -> &MessagesContainer {
        self.subscription.container()
    }

    /// The text input.
    #[must_use]
    pub fn input(&self) -> &TextInput {
        &self.input
    }

    /// The chat subscription.
    #[must_use]
    pub fn subscription(&self) -> &ChatSubscription {
        &self.subscription
    }

    /// Handles one event to completion.
    ///
    /// Clicking `send` posts the current input value as is, including an
    /// empty one.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] if a command cannot be queued.
    pub fn dispatch(&mut self, event: PageEvent) -> Result<(), ClientError> {
        match event {
            PageEvent::Input(value) => self.input.set_value(value),
            PageEvent::Click(ElementId::Send) => {
                self.subscription.post_message(self.input.value())?;
            }
            PageEvent::Click(_) => {}
            PageEvent::Server(message) => self.deliver(message),
        }
        Ok(())
    }

    fn deliver(&mut self, message: ServerMessage) {
        let own = self.subscription.handle().identifier().to_string();
        match self.consumer.route(message) {
            Delivery::Confirmed(identifier) if identifier == own => self.subscription.connected(),
            Delivery::Message {
                identifier,
                payload,
            } if identifier == own => self.subscription.received(&payload),
            Delivery::Rejected(identifier) => {
                tracing::warn!(identifier = %identifier, "subscription rejected");
            }
            Delivery::Disconnected { reason, reconnect } => {
                tracing::warn!(reason = %reason, reconnect, "disconnected by server");
            }
            Delivery::Welcome => tracing::debug!("welcome received"),
            _ => {}
        }
    }
}
