//! Async WebSocket chat client with session switching and reconnection.
//!
//! This library manages one WebSocket connection per chat session: it
//! tears the socket down on session switches, reconnects with exponential
//! backoff when the connection drops, and surfaces everything a renderer
//! needs through a typed event stream.
//!
//! # Architecture
//!
//! All connection state lives in one dispatch task, driven by caller
//! commands, transport lifecycle signals, and reconnect timer fires:
//!
//! - [`ChatClient`] is a cheap-to-clone handle into the dispatch task
//! - Each dial spawns a transport task for exactly one socket; transports
//!   are tagged with an epoch so a superseded socket's late events are
//!   dropped rather than mutating current state
//! - Reconnection backs off exponentially (1s, 2s, 4s, ...) and gives up
//!   after 7 consecutive failures; a successful open resets the counters
//!
//! # Quick Start
//!
//! ```no_run
//! use chatsocket::{ChatClient, ClientEvent, SessionId};
//!
//! #[tokio::main]
//! async fn main() -> chatsocket::Result<()> {
//!     let (client, mut events) = ChatClient::builder()
//!         .base_url("https://chat.example")
//!         .build()?;
//!
//!     // Repopulate history and connect the session socket.
//!     client.fetch_history(SessionId::new(1)).await?;
//!     client.select_session(SessionId::new(1))?;
//!
//!     client.send_chat("hello").await?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             ClientEvent::Message(message) => {
//!                 println!("{}: {}", message.role, message.content);
//!             }
//!             ClientEvent::StateChanged { state, .. } => {
//!                 eprintln!("connection: {state}");
//!             }
//!             _ => {}
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`ChatClient`], builder, events, state machine |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`history`] | Session history endpoint |
//! | [`protocol`] | Chat message wire types |
//! | [`session`] | [`SessionId`] and endpoint construction |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Chat client: connection manager, reconnect policy, and event surface.
///
/// Use [`ChatClient::builder()`] to configure and start a client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Session history endpoint.
///
/// Repopulates the message list when a session is selected.
pub mod history;

/// Chat protocol message types.
///
/// JSON shapes spoken over the per-session socket.
pub mod protocol;

/// Session identity and endpoint construction.
pub mod session;

/// WebSocket transport layer.
///
/// Internal module handling the per-session socket and its event loop.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ChatClient, ClientBuilder, ClientEvent, CloseKind, ConnectionState};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{ChatMessage, Inbound, Outbound};

// Session types
pub use session::{Endpoints, SessionId};
