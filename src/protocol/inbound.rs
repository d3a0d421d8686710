//! Inbound message types.
//!
//! Inbound messages travel from the chat server to the client over the
//! session socket. A frame is either a rendered chat message (role plus
//! content) or a function-call notification.
//!
//! # Wire Format
//!
//! | Message | JSON |
//! |---------|------|
//! | Chat | `{"role": "...", "content": "..."}` |
//! | Function call | `{"is_function_call": true, "function_approval_required": bool}` |
//!
//! An absent `function_approval_required` flag means no approval is needed.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// ChatMessage
// ============================================================================

/// One rendered chat message: a speaker role and its text content.
///
/// Also the record shape returned by the session history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker identity (e.g. `user`, `assistant`, `system`).
    pub role: String,

    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a chat message.
    #[inline]
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

// ============================================================================
// Inbound
// ============================================================================

/// A parsed message from the chat server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A chat message to render.
    Chat(ChatMessage),

    /// The server prepared a function call.
    ///
    /// When `approval_required` is false the client auto-confirms by
    /// transmitting the invoke-function control signal; otherwise the user
    /// must approve first.
    FunctionCall {
        /// Whether explicit user approval is required before invocation.
        approval_required: bool,
    },
}

/// Raw frame shape covering both inbound variants.
#[derive(Debug, Deserialize)]
struct RawInbound {
    role: Option<String>,
    content: Option<String>,
    #[serde(default)]
    is_function_call: bool,
    function_approval_required: Option<bool>,
}

impl Inbound {
    /// Parses an inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the frame is not valid JSON
    /// - [`Error::Protocol`] if the frame matches neither message shape
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawInbound = serde_json::from_str(text)?;

        if raw.is_function_call {
            return Ok(Self::FunctionCall {
                approval_required: raw.function_approval_required.unwrap_or(false),
            });
        }

        match (raw.role, raw.content) {
            (Some(role), Some(content)) => Ok(Self::Chat(ChatMessage { role, content })),
            _ => Err(Error::protocol(
                "frame has neither role/content nor is_function_call",
            )),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_message() {
        let inbound =
            Inbound::parse(r#"{"role": "assistant", "content": "hello"}"#).expect("parse");

        assert_eq!(
            inbound,
            Inbound::Chat(ChatMessage::new("assistant", "hello"))
        );
    }

    #[test]
    fn test_parse_function_call_with_approval() {
        let inbound =
            Inbound::parse(r#"{"is_function_call": true, "function_approval_required": true}"#)
                .expect("parse");

        assert_eq!(
            inbound,
            Inbound::FunctionCall {
                approval_required: true
            }
        );
    }

    #[test]
    fn test_parse_function_call_without_approval_flag() {
        // An absent approval flag defaults to no approval needed.
        let inbound = Inbound::parse(r#"{"is_function_call": true}"#).expect("parse");

        assert_eq!(
            inbound,
            Inbound::FunctionCall {
                approval_required: false
            }
        );
    }

    #[test]
    fn test_parse_multiline_content() {
        let inbound =
            Inbound::parse(r#"{"role": "user", "content": "line one\nline two"}"#).expect("parse");

        match inbound {
            Inbound::Chat(message) => assert_eq!(message.content, "line one\nline two"),
            other => panic!("expected chat message, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        let result = Inbound::parse("not json");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_parse_unknown_shape_fails() {
        let result = Inbound::parse(r#"{"something": "else"}"#);
        assert!(matches!(result, Err(Error::Protocol { .. })));
    }

    #[test]
    fn test_history_record_deserializes() {
        let records: Vec<ChatMessage> = serde_json::from_str(
            r#"[
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ]"#,
        )
        .expect("deserialize");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ChatMessage::new("user", "hi"));
    }
}
