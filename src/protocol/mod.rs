//! Action Cable wire types shared by the server and the client.
//!
//! Every frame on the socket is a JSON text message. Clients send
//! [`CommandMessage`]s; the server answers with [`ServerMessage`]s.
//! Publishers reach the gateway with a [`BroadcastPayload`].

pub mod broadcast;
pub mod identifier;
pub mod messages;

pub use broadcast::{BroadcastPayload, DisconnectPayload, RemoteCommand, StreamBroadcast};
pub use identifier::{ChannelIdentifier, ConnectionIdentifiers};
pub use messages::{ActionData, ChannelMessage, CommandMessage, ControlMessage, ServerMessage};
