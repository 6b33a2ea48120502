//! Domain layer: pub/sub bus, subscription state and connection requests.
//!
//! These types carry no transport concerns; the WebSocket layer and the
//! channel framework both build on them.

pub mod pubsub;
pub mod request;
pub mod state;

pub use pubsub::{BusEvent, PubSub, StreamMessage};
pub use request::ConnectionRequest;
pub use state::ChannelState;
