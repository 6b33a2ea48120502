//! Cable URL construction from the hosting page's URL.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::Uri;

use super::error::ClientError;
use crate::chat::authorization::USER_PARAM;

/// Path the cable endpoint is mounted at by default.
pub const DEFAULT_CABLE_PATH: &str = "/cable";

/// Builds the WebSocket URL for the page at `page_url`.
///
/// Host and port are taken from the page. The page's `user` query
/// parameter, when present, is forwarded percent-encoded. An `https` page
/// yields a `wss` URL; anything else yields `ws`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidUrl`] if `page_url` cannot be parsed or
/// has no host.
pub fn cable_url(page_url: &str, path: &str) -> Result<String, ClientError> {
    let uri: Uri = page_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{page_url}: {e}")))?;
    let host = uri
        .host()
        .ok_or_else(|| ClientError::InvalidUrl(format!("{page_url}: missing host")))?;

    let scheme = match uri.scheme_str() {
        Some("https" | "wss") => "wss",
        _ => "ws",
    };
    let authority = match uri.port_u16() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let query = Query::<HashMap<String, String>>::try_from_uri(&uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    Ok(match query.get(USER_PARAM) {
        Some(user) => format!(
            "{scheme}://{authority}{path}?{USER_PARAM}={}",
            urlencoding::encode(user)
        ),
        None => format!("{scheme}://{authority}{path}"),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn build(page_url: &str) -> String {
        match cable_url(page_url, DEFAULT_CABLE_PATH) {
            Ok(url) => url,
            Err(e) => panic!("unexpected error for {page_url}: {e}"),
        }
    }

    #[test]
    fn user_is_forwarded() {
        let url = build("http://localhost:3000/?user=bob");
        assert_eq!(url, "ws://localhost:3000/cable?user=bob");
        assert!(url.contains("user=bob"));
    }

    #[test]
    fn no_user_no_query() {
        assert_eq!(
            build("http://chat.example.com/rooms"),
            "ws://chat.example.com/cable"
        );
    }

    #[test]
    fn user_is_percent_encoded() {
        assert_eq!(
            build("http://localhost:3000/?user=ada%20lovelace"),
            "ws://localhost:3000/cable?user=ada%20lovelace"
        );
    }

    #[test]
    fn empty_user_is_kept() {
        assert_eq!(
            build("http://localhost:3000/?user="),
            "ws://localhost:3000/cable?user="
        );
    }

    #[test]
    fn other_params_dropped() {
        assert_eq!(
            build("http://localhost:3000/?room=1&user=bob"),
            "ws://localhost:3000/cable?user=bob"
        );
    }

    #[test]
    fn https_page_uses_wss() {
        assert_eq!(
            build("https://chat.example.com/?user=bob"),
            "wss://chat.example.com/cable?user=bob"
        );
    }

    #[test]
    fn custom_path_without_slash() {
        let url = cable_url("http://localhost:8080/", "ws");
        assert!(matches!(url.as_deref(), Ok("ws://localhost:8080/ws")));
    }

    #[test]
    fn relative_url_rejected() {
        let result = cable_url("/only/a/path?user=bob", DEFAULT_CABLE_PATH);
        assert!(matches!(result, Err(ClientError::InvalidUrl(_))));
    }
}
