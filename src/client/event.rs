//! Renderer-facing events and connection states.
//!
//! The client surfaces everything a renderer needs through a single event
//! stream: chat messages to append, history to repopulate, approval
//! affordances to show or remove, and connection state changes for the
//! session indicator.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::protocol::ChatMessage;
use crate::session::SessionId;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the active session's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session selected yet.
    Idle,

    /// Dial in flight.
    Connecting,

    /// Socket established; messages flow.
    Open,

    /// Socket ended.
    Closed(CloseKind),
}

/// What happens after a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// A reconnect is scheduled.
    WillReconnect,

    /// No reconnect will be attempted: reconnection was disabled, or the
    /// attempt ceiling was reached. Selecting a session again is the only
    /// way out.
    Final,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed(CloseKind::WillReconnect) => write!(f, "closed (reconnecting)"),
            Self::Closed(CloseKind::Final) => write!(f, "closed"),
        }
    }
}

// ============================================================================
// ClientEvent
// ============================================================================

/// An event for the renderer collaborator.
///
/// Consumed from the receiver returned by
/// [`ClientBuilder::build`](crate::ClientBuilder::build).
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The connection state changed for a session.
    StateChanged {
        /// Session the state belongs to.
        session: SessionId,
        /// New state.
        state: ConnectionState,
    },

    /// A chat message arrived; append it to the message list.
    Message(ChatMessage),

    /// Session history fetched; replace the message list.
    History {
        /// Session the history belongs to.
        session: SessionId,
        /// Ordered message records, oldest first.
        messages: Vec<ChatMessage>,
    },

    /// The server prepared a function call that needs user approval.
    /// Show a single approval affordance; at most one is ever pending.
    ApprovalRequested,

    /// Remove the pending approval affordance, if one is shown.
    ApprovalCleared,
}

// ============================================================================
// Tests
// ============================================================================
