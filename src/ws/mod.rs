//! WebSocket layer: upgrade handling, session loop, subscriptions.
//!
//! The WebSocket endpoint (`/cable` by default) speaks the Action Cable
//! JSON protocol: clients subscribe to channels, perform actions, and
//! receive broadcasts on the streams their subscriptions follow.

pub mod connection;
pub mod handler;
pub mod subscription;
