//! Session identity and endpoint construction.
//!
//! A session is one logical chat conversation. Exactly one session is
//! active per [`ChatClient`](crate::ChatClient) at a time; each session has
//! its own socket endpoint and message history endpoint, both derived from
//! the configured base origin.
//!
//! # Endpoints
//!
//! | Endpoint | Format |
//! |----------|--------|
//! | Socket | `<ws\|wss>://<host>/ws/chat/<session_id>/` |
//! | History | `<http\|https>://<host>/api/chats/<session_id>/` |
//!
//! The socket scheme follows the base origin: `http` maps to `ws`, `https`
//! maps to `wss`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// SessionId
// ============================================================================

/// Identifier for a chat session.
///
/// Session ids are assigned by the chat server and treated as opaque here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    /// Creates a session id from its numeric value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Endpoint factory for a chat server origin.
///
/// Holds the validated base origin and derives per-session socket and
/// history URLs from it.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Base origin (http or https).
    base: Url,
}

impl Endpoints {
    /// Creates an endpoint factory from a base origin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the origin scheme is not `http` or
    /// `https`, or if the origin has no host.
    pub fn new(base: Url) -> Result<Self> {
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base origin must be http or https, got: {}",
                base.scheme()
            )));
        }

        if base.host_str().is_none() {
            return Err(Error::config("base origin has no host"));
        }

        Ok(Self { base })
    }

    /// Parses and validates a base origin string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the string is not a valid http(s) URL.
    pub fn parse(base: &str) -> Result<Self> {
        let url = Url::parse(base)
            .map_err(|e| Error::config(format!("invalid base origin {base:?}: {e}")))?;
        Self::new(url)
    }

    /// Returns the base origin.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Returns the WebSocket URL for a session.
    ///
    /// Format: `ws://<host>/ws/chat/<session_id>/` (or `wss` for an https
    /// origin).
    #[must_use]
    pub fn socket_url(&self, session: SessionId) -> Url {
        let mut url = self.base.clone();
        let scheme = if self.base.scheme() == "https" {
            "wss"
        } else {
            "ws"
        };
        // set_scheme is only fallible for special-scheme mismatches that
        // cannot occur for validated http(s) origins.
        let _ = url.set_scheme(scheme);
        url.set_path(&format!("/ws/chat/{session}/"));
        url
    }

    /// Returns the message history URL for a session.
    ///
    /// Format: `<http|https>://<host>/api/chats/<session_id>/`.
    #[must_use]
    pub fn history_url(&self, session: SessionId) -> Url {
        let mut url = self.base.clone();
        url.set_path(&format!("/api/chats/{session}/"));
        url
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn test_session_id_serde_transparent() {
        let id: SessionId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(id, SessionId::new(7));
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "7");
    }

    #[test]
    fn test_socket_url_plain() {
        let endpoints = Endpoints::parse("http://chat.example").expect("parse");
        let url = endpoints.socket_url(SessionId::new(3));
        assert_eq!(url.as_str(), "ws://chat.example/ws/chat/3/");
    }

    #[test]
    fn test_socket_url_secure() {
        let endpoints = Endpoints::parse("https://chat.example").expect("parse");
        let url = endpoints.socket_url(SessionId::new(3));
        assert_eq!(url.as_str(), "wss://chat.example/ws/chat/3/");
    }

    #[test]
    fn test_socket_url_keeps_port() {
        let endpoints = Endpoints::parse("http://localhost:8000").expect("parse");
        let url = endpoints.socket_url(SessionId::new(12));
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/chat/12/");
    }

    #[test]
    fn test_history_url() {
        let endpoints = Endpoints::parse("https://chat.example").expect("parse");
        let url = endpoints.history_url(SessionId::new(9));
        assert_eq!(url.as_str(), "https://chat.example/api/chats/9/");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let result = Endpoints::parse("ftp://chat.example");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_invalid_url() {
        let result = Endpoints::parse("not a url");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
