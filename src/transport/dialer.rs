//! Socket dialing seam.
//!
//! [`Dialer`] abstracts WebSocket establishment so the connection lifecycle
//! can be driven against scripted transports in tests. The production
//! implementation is [`WebSocketDialer`], a thin wrapper over
//! `tokio_tungstenite::connect_async`.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use async_trait::async_trait;
use futures_util::{Sink, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Write half of an established socket.
pub type WsSink = Box<dyn Sink<Message, Error = WsError> + Send + Unpin>;

/// Read half of an established socket.
pub type WsSource = Box<dyn Stream<Item = StdResult<Message, WsError>> + Send + Unpin>;

// ============================================================================
// Dialer
// ============================================================================

/// Establishes WebSocket connections for the chat transport.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// Dials the given socket URL and returns the split halves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the socket cannot be established.
    async fn dial(&self, url: &Url) -> Result<(WsSink, WsSource)>;
}

// ============================================================================
// WebSocketDialer
// ============================================================================

/// Production dialer backed by `tokio_tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketDialer;

#[async_trait]
impl Dialer for WebSocketDialer {
    async fn dial(&self, url: &Url) -> Result<(WsSink, WsSource)> {
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| Error::connection(format!("WebSocket connect failed: {e}")))?;

        debug!(%url, status = %response.status(), "chat socket handshake complete");

        let (sink, source) = stream.split();
        Ok((Box::new(sink), Box::new(source)))
    }
}

// ============================================================================
// Tests
// ============================================================================
