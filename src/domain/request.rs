//! The HTTP upgrade request a connection was opened with.
//!
//! Handlers authorize connections from the URL query, headers and cookies
//! captured here. The request is immutable for the life of the session.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::{HeaderMap, Uri};

use crate::error::CableError;

/// Snapshot of the upgrade request.
#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    uri: Uri,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
}

impl ConnectionRequest {
    /// Captures the URI and headers of an upgrade request.
    ///
    /// Header names are stored lower-cased; headers that are not valid
    /// UTF-8 are skipped. A query string that cannot be decoded is treated
    /// as empty.
    #[must_use]
    pub fn from_parts(uri: Uri, headers: &HeaderMap) -> Self {
        let query = Query::<HashMap<String, String>>::try_from_uri(&uri)
            .map(|Query(q)| q)
            .unwrap_or_default();
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        Self {
            uri,
            query,
            headers,
        }
    }

    /// Parses `url` into a request without headers.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::InvalidRequest`] if `url` is not a valid URI.
    pub fn from_url(url: &str) -> Result<Self, CableError> {
        let uri: Uri = url
            .parse()
            .map_err(|e| CableError::InvalidRequest(format!("invalid url {url:?}: {e}")))?;
        Ok(Self::from_parts(uri, &HeaderMap::new()))
    }

    /// Adds a header, replacing any previous value with the same name.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// The request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the decoded query parameter `key`, if present.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Returns the header `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns the cookie `name` from the `Cookie` header.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.header("cookie")?.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| {
                urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string())
            })
        })
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
    fn reads_query_param() {
        let req = request("/cable?user=alice&room=lobby");
        assert_eq!(req.query_param("user"), Some("alice"));
        assert_eq!(req.query_param("room"), Some("lobby"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn decodes_percent_encoded_query() {
        let req = request("/cable?user=john%20green");
        assert_eq!(req.query_param("user"), Some("john green"));
    }

    #[test]
    fn empty_query_param_is_present() {
        let req = request("/cable?user=");
        assert_eq!(req.query_param("user"), Some(""));
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = request("/cable").with_header("X-Api-Token", "abc");
        assert_eq!(req.header("x-api-token"), Some("abc"));
        assert_eq!(req.header("X-API-TOKEN"), Some("abc"));
    }

    #[test]
    fn reads_cookie() {
        let req = request("/cable").with_header("Cookie", "a=1; username=john%20green");
        assert_eq!(req.cookie("username").as_deref(), Some("john green"));
        assert_eq!(req.cookie("a").as_deref(), Some("1"));
        assert_eq!(req.cookie("b"), None);
    }

    #[test]
    fn from_parts_keeps_uri() {
        let Ok(uri) = "ws://localhost:9000/cable?user=bob".parse::<Uri>() else {
            panic!("valid uri");
        };
        let req = ConnectionRequest::from_parts(uri, &HeaderMap::new());
        assert_eq!(req.uri().path(), "/cable");
        assert_eq!(req.query_param("user"), Some("bob"));
    }
}
