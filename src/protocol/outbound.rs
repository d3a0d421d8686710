//! Outbound message types.
//!
//! Outbound messages travel from the client to the chat server over the
//! session socket. There are two shapes: chat content and control signals
//! requesting a server-side action.
//!
//! # Wire Format
//!
//! | Message | JSON |
//! |---------|------|
//! | Chat | `{"content": "..."}` |
//! | Invoke AI | `{"invoke_ai": true}` |
//! | Invoke function | `{"invoke_function": true}` |

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use crate::error::Result;

// ============================================================================
// Outbound
// ============================================================================

/// A message from the client to the chat server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Plain chat content typed by the user.
    Chat {
        /// Message text. Must be non-empty; emptiness is checked by the
        /// dispatch loop before a `Chat` is ever constructed.
        content: String,
    },

    /// Control signal asking the server to run the AI over the session.
    InvokeAi,

    /// Control signal asking the server to execute the pending function
    /// call.
    InvokeFunction,
}

impl Outbound {
    /// Creates a chat message.
    #[inline]
    #[must_use]
    pub fn chat(content: impl Into<String>) -> Self {
        Self::Chat {
            content: content.into(),
        }
    }

    /// Returns a short name for logging.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Chat { .. } => "chat",
            Self::InvokeAi => "invoke_ai",
            Self::InvokeFunction => "invoke_function",
        }
    }

    /// Returns the wire representation as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Chat { content } => json!({ "content": content }),
            Self::InvokeAi => json!({ "invoke_ai": true }),
            Self::InvokeFunction => json!({ "invoke_function": true }),
        }
    }

    /// Serializes into a WebSocket text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn into_message(self) -> Result<Message> {
        let json = serde_json::to_string(&self.to_json())?;
        Ok(Message::Text(json.into()))
    }
}

// ============================================================================
// Tests
// ============================================================================
