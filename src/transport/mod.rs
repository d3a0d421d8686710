//! WebSocket transport layer.
//!
//! This module owns the live socket for the active chat session and the
//! task that pumps it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                         ┌─────────────────┐
//! │  Dispatch loop   │  TransportEvent (mpsc)  │  Transport task │
//! │  (client module) │◄────────────────────────│  one per dial   │
//! │                  │────────────────────────►│                 │
//! └──────────────────┘  TransportCommand       └────────┬────────┘
//!                                                       │ WebSocket
//!                                                       ▼
//!                                              <scheme>://host/ws/chat/<id>/
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Transport::dial` - Spawn the event loop for one session socket
//! 2. Event loop dials via the configured [`Dialer`]
//! 3. `Opened` / `Frame` / `Closed` events flow back, tagged with the epoch
//! 4. `Transport::shutdown` - Close the socket; the final `Closed` still
//!    fires and is dropped by the dispatch loop if the epoch is stale
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Transport handle and per-socket event loop |
//! | `dialer` | Socket establishment seam |

// ============================================================================
// Submodules
// ============================================================================

/// Transport handle and per-socket event loop.
pub mod connection;

/// Socket dialing seam.
pub mod dialer;

/// Scripted transports for tests.
#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Transport, TransportEvent, TransportEventKind};
pub use dialer::{Dialer, WebSocketDialer, WsSink, WsSource};
