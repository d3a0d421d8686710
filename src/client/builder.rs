//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and starting a
//! [`ChatClient`](crate::ChatClient).
//!
//! # Example
//!
//! ```no_run
//! use chatsocket::ChatClient;
//!
//! # fn example() -> chatsocket::Result<()> {
//! let (client, events) = ChatClient::builder()
//!     .base_url("https://chat.example")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::session::Endpoints;
use crate::transport::{Dialer, WebSocketDialer};

use super::event::ClientEvent;
use super::manager::ChatClient;
use super::reconnect::{DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS};

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`ChatClient`] instance.
///
/// Use [`ChatClient::builder()`] to create a new builder.
#[derive(Clone)]
pub struct ClientBuilder {
    /// Base origin of the chat server.
    base_url: Option<String>,

    /// Delay before the first reconnect attempt.
    initial_backoff: Duration,

    /// Maximum consecutive reconnect attempts.
    max_reconnect_attempts: u32,

    /// Dialer override, for driving the lifecycle against scripted sockets.
    dialer: Option<Arc<dyn Dialer>>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_reconnect_attempts: DEFAULT_MAX_ATTEMPTS,
            dialer: None,
        }
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new client builder with default reconnect policy.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base origin of the chat server.
    ///
    /// The socket scheme is derived from it: `http` origins connect over
    /// `ws`, `https` origins over `wss`.
    ///
    /// # Arguments
    ///
    /// * `url` - Origin URL (e.g., "https://chat.example")
    #[inline]
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the delay before the first reconnect attempt.
    ///
    /// The delay doubles per consecutive failed attempt. Defaults to 1s.
    #[inline]
    #[must_use]
    pub fn initial_backoff(mut self, delay: Duration) -> Self {
        self.initial_backoff = delay;
        self
    }

    /// Sets the maximum number of consecutive reconnect attempts.
    ///
    /// Defaults to 7. Zero disables automatic reconnection entirely.
    #[inline]
    #[must_use]
    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Overrides the socket dialer.
    ///
    /// The default dialer connects with `tokio_tungstenite`. Supplying a
    /// custom [`Dialer`] routes sockets through other transports (or, in
    /// tests, through scripted in-memory sockets).
    #[inline]
    #[must_use]
    pub fn dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    /// Builds the client and spawns its dispatch loop.
    ///
    /// Returns the handle together with the renderer event receiver. Must
    /// be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base origin is missing or not a
    /// valid http(s) URL.
    pub fn build(self) -> Result<(ChatClient, mpsc::UnboundedReceiver<ClientEvent>)> {
        let base = self.base_url.ok_or_else(|| {
            Error::config(
                "base origin is required. Use .base_url() to set it.\n\
                 Example: ChatClient::builder().base_url(\"https://chat.example\")",
            )
        })?;

        let endpoints = Endpoints::parse(&base)?;
        let dialer = self
            .dialer
            .unwrap_or_else(|| Arc::new(WebSocketDialer));

        Ok(ChatClient::spawn(
            endpoints,
            dialer,
            self.initial_backoff,
            self.max_reconnect_attempts,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
