//! # cable-gateway
//!
//! Action Cable compatible channel server and the matching chat client.
//!
//! The server speaks the `actioncable-v1-json` WebSocket subprotocol. Each
//! connection is authorized by a [`server::ConnectionHandler`], then
//! subscribes to named channels whose [`server::ChannelHandler`]s attach the
//! session to pub/sub streams and react to client actions. The bundled chat
//! application identifies users by the `user` query parameter and fans every
//! `message` action out to all subscribers of the `chat` stream.
//!
//! ## Architecture
//!
//! ```text
//! Browser / cable-chat client
//!     │
//!     ├── WS Handler (ws/)            REST Handlers (api/)
//!     │       │                              │
//!     │       ├── CableServer (server/)      │
//!     │       │     ├── ChatConnection       │
//!     │       │     └── ChatChannel (chat/)  │
//!     │       │                              │
//!     │       │   Broadcaster (broadcast/) ──┤
//!     │       │     ├── local adapter        │
//!     │       │     └── HTTP adapter ──► remote /_broadcast
//!     │       │                              │
//!     │       └──────── PubSub (domain/) ────┘
//!     │
//!     └── Client runtime (client/)
//!           ├── Consumer + SubscriptionHooks
//!           └── ChatPage + EventLoop
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod broadcast;
pub mod chat;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod protocol;
pub mod server;
pub mod ws;
