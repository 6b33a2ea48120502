//! REST endpoint handlers.

pub mod broadcast;
pub mod system;
