//! Chat client: connection manager, reconnect policy, and event surface.
//!
//! The [`ChatClient`] handle drives a single dispatch task that owns the
//! connection state machine for the active session. Renderers consume the
//! [`ClientEvent`] stream returned by [`ClientBuilder::build`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent configuration for [`ChatClient`] |
//! | `event` | Renderer-facing events and [`ConnectionState`] |
//! | `manager` | Dispatch loop and state machine |
//! | `reconnect` | Backoff counters (internal) |

// ============================================================================
// Submodules
// ============================================================================

/// Builder pattern for client configuration.
pub mod builder;

/// Renderer-facing events and connection states.
pub mod event;

/// Connection manager and dispatch loop.
pub mod manager;

/// Reconnect bookkeeping.
mod reconnect;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use event::{ClientEvent, CloseKind, ConnectionState};
pub use manager::ChatClient;
