//! Chat client runtime.
//!
//! A [`ChatPage`] owns the cable [`Consumer`], the chat subscription and
//! the modelled DOM. Every input (typing, clicks, server frames) is posted
//! to an [`EventLoop`] and dispatched to the page one event at a time.
//! [`transport::connect`] bridges the consumer's outbox and the inbound
//! frames to a real WebSocket.

pub mod app;
pub mod consumer;
pub mod error;
pub mod event_loop;
pub mod page;
pub mod subscription;
pub mod transport;
pub mod url;

pub use app::{ChatPage, PageEvent};
pub use consumer::{Consumer, Delivery, SubscriptionHandle};
pub use error::ClientError;
pub use event_loop::EventLoop;
pub use page::{ElementId, MessagesContainer, TextInput, render_message};
pub use subscription::{ChatSubscription, SubscriptionHooks};
