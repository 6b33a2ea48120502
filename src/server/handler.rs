//! Application hooks: what happens when clients connect, subscribe and
//! perform actions.

use std::fmt;

use super::{Channel, Connection};
use crate::error::CableError;
use crate::protocol::ActionData;

/// Connection lifecycle hooks.
///
/// Returning an error from [`ConnectionHandler::connect`] rejects the
/// connection; the error message becomes the disconnect reason.
pub trait ConnectionHandler: Send + Sync + fmt::Debug {
    /// Called when a client opens the socket.
    ///
    /// # Errors
    ///
    /// Any error rejects the connection.
    fn connect(&self, _conn: &mut Connection<'_>) -> Result<(), CableError> {
        Ok(())
    }

    /// Called after the client is gone and its subscriptions are torn down.
    ///
    /// # Errors
    ///
    /// Errors are logged; the connection is already closed.
    fn disconnect(&self, _conn: &mut Connection<'_>) -> Result<(), CableError> {
        Ok(())
    }
}

/// Channel hooks, registered per channel name.
pub trait ChannelHandler: Send + Sync + fmt::Debug {
    /// Called on `subscribe`. Call [`Channel::reject`] to refuse.
    ///
    /// # Errors
    ///
    /// Any error fails the command; no confirmation is sent.
    fn subscribed(&self, _conn: &mut Connection<'_>, _ch: &mut Channel) -> Result<(), CableError> {
        Ok(())
    }

    /// Called on `unsubscribe` and for every live subscription on
    /// disconnect.
    ///
    /// # Errors
    ///
    /// Any error fails the command.
    fn unsubscribed(
        &self,
        _conn: &mut Connection<'_>,
        _ch: &mut Channel,
    ) -> Result<(), CableError> {
        Ok(())
    }

    /// Called on `message` with the decoded action name and data.
    ///
    /// # Errors
    ///
    /// The default returns [`CableError::UnknownAction`].
    fn perform(
        &self,
        _conn: &mut Connection<'_>,
        ch: &mut Channel,
        action: &str,
        _data: &ActionData,
    ) -> Result<(), CableError> {
        Err(CableError::UnknownAction {
            action: action.to_string(),
            channel: ch.name().to_string(),
        })
    }
}

/// Accepts every connection without binding an identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl ConnectionHandler for AcceptAll {}
