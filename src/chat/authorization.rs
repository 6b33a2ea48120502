//! User identification for chat connections.
//!
//! ```text
//! Unauthenticated ──(user param present)──▶ Identified(user)
//!        │
//!        └────────(user param absent)─────▶ Rejected
//! ```
//!
//! Both outcomes are terminal. Presence is the only check; the value is
//! not validated against any session or token store.

use crate::domain::ConnectionRequest;

/// Query parameter carrying the user identity.
pub const USER_PARAM: &str = "user";

/// Authorization state of one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserAuthorization {
    /// No decision yet.
    #[default]
    Unauthenticated,
    /// The connection proceeds with this identity.
    Identified(String),
    /// The connection is refused.
    Rejected,
}

impl UserAuthorization {
    /// Decides a connection attempt from its upgrade request.
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn authorize(self, request: &ConnectionRequest) -> Self {
        match self {
            Self::Unauthenticated => match request.query_param(USER_PARAM) {
                Some(user) => Self::Identified(user.to_string()),
                None => Self::Rejected,
            },
            terminal => terminal,
        }
    }

    /// The bound identity, if identified.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        match self {
            Self::Identified(user) => Some(user),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn request(url: &str) -> ConnectionRequest {
        let Ok(req) = ConnectionRequest::from_url(url) else {
            panic!("valid url");
        };
        req
    }

    #[test]
    fn missing_user_is_rejected() {
        let state = UserAuthorization::default().authorize(&request("/cable"));
        assert_eq!(state, UserAuthorization::Rejected);
        assert_eq!(state.user(), None);
    }

    #[test]
    fn user_param_identifies() {
        let state = UserAuthorization::default().authorize(&request("/cable?user=alice"));
        assert_eq!(state, UserAuthorization::Identified("alice".to_string()));
        assert_eq!(state.user(), Some("alice"));
    }

    #[test]
    fn empty_user_counts_as_present() {
        let state = UserAuthorization::default().authorize(&request("/cable?user="));
        assert_eq!(state.user(), Some(""));
    }

    #[test]
    fn terminal_states_do_not_transition() {
        let rejected = UserAuthorization::Rejected.authorize(&request("/cable?user=alice"));
        assert_eq!(rejected, UserAuthorization::Rejected);

        let identified =
            UserAuthorization::Identified("bob".to_string()).authorize(&request("/cable"));
        assert_eq!(identified.user(), Some("bob"));
    }
}
