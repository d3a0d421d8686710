//! WebSocket transport and per-connection event loop.
//!
//! Each [`Transport`] owns one socket for one chat session. A tokio task
//! pumps the socket and forwards lifecycle signals to the dispatch loop as
//! [`TransportEvent`]s:
//!
//! - `Opened` once the dial completes
//! - `Frame` for each inbound text frame
//! - `Closed` exactly once, when the socket ends for any reason (remote
//!   close, network failure, failed dial, or local shutdown)
//!
//! # Epoch Tagging
//!
//! Every event carries the epoch the transport was dialed under. A
//! superseded transport keeps running until its loop notices the shutdown
//! command, so its late events can still arrive; the dispatch loop drops
//! any event whose epoch is not current. This is the handler-neutralization
//! invariant: a stale transport cannot mutate state owned by its successor.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{Error, Result};

use super::dialer::Dialer;

// ============================================================================
// TransportEvent
// ============================================================================

/// A lifecycle signal from a transport task to the dispatch loop.
#[derive(Debug)]
pub struct TransportEvent {
    /// Epoch the transport was dialed under.
    pub epoch: u64,

    /// What happened.
    pub kind: TransportEventKind,
}

/// The kinds of transport lifecycle signal.
#[derive(Debug, PartialEq, Eq)]
pub enum TransportEventKind {
    /// The socket is established and ready to carry messages.
    Opened,

    /// An inbound text frame arrived.
    Frame(String),

    /// The socket ended. Emitted exactly once per transport, for every
    /// termination path including a failed dial.
    Closed,
}

// ============================================================================
// TransportCommand
// ============================================================================

/// Internal commands for the transport task.
enum TransportCommand {
    /// Write a frame to the socket.
    Send(Message),

    /// Close the socket and terminate the task.
    Shutdown,
}

// ============================================================================
// Transport
// ============================================================================

/// Handle to one live chat socket.
///
/// Dropping the handle (without [`Transport::shutdown`]) also terminates
/// the task, since the command channel closes.
pub struct Transport {
    /// Channel into the transport task.
    command_tx: mpsc::UnboundedSender<TransportCommand>,

    /// Epoch this transport was dialed under.
    epoch: u64,
}

impl Transport {
    /// Dials a socket and spawns its event loop.
    ///
    /// Returns immediately; the dial outcome is reported through
    /// `event_tx` as `Opened` or `Closed`.
    pub(crate) fn dial(
        dialer: Arc<dyn Dialer>,
        url: Url,
        epoch: u64,
        event_tx: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_event_loop(dialer, url, epoch, command_rx, event_tx));

        Self { command_tx, epoch }
    }

    /// Returns the epoch this transport was dialed under.
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Queues a frame for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the transport task has
    /// terminated.
    pub fn send(&self, message: Message) -> Result<()> {
        self.command_tx
            .send(TransportCommand::Send(message))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Closes the socket and terminates the transport task.
    ///
    /// The task still emits its final `Closed` event; the caller decides
    /// whether that event is current or stale by epoch.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(TransportCommand::Shutdown);
    }

    /// Event loop pumping one socket.
    async fn run_event_loop(
        dialer: Arc<dyn Dialer>,
        url: Url,
        epoch: u64,
        mut command_rx: mpsc::UnboundedReceiver<TransportCommand>,
        event_tx: mpsc::UnboundedSender<TransportEvent>,
    ) {
        let (mut ws_write, mut ws_read) = match dialer.dial(&url).await {
            Ok(halves) => halves,
            Err(e) => {
                warn!(error = %e, %url, epoch, "chat socket dial failed");
                let _ = event_tx.send(TransportEvent {
                    epoch,
                    kind: TransportEventKind::Closed,
                });
                return;
            }
        };

        debug!(%url, epoch, "chat socket open");
        let _ = event_tx.send(TransportEvent {
            epoch,
            kind: TransportEventKind::Opened,
        });

        loop {
            tokio::select! {
                // Inbound frames from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            let _ = event_tx.send(TransportEvent {
                                epoch,
                                kind: TransportEventKind::Frame(text.to_string()),
                            });
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!(epoch, "chat socket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, epoch, "chat socket error");
                            break;
                        }

                        None => {
                            debug!(epoch, "chat socket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the dispatch loop
                command = command_rx.recv() => {
                    match command {
                        Some(TransportCommand::Send(message)) => {
                            if let Err(e) = ws_write.send(message).await {
                                warn!(error = %e, epoch, "chat socket send failed");
                                break;
                            }
                        }

                        Some(TransportCommand::Shutdown) => {
                            debug!(epoch, "shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!(epoch, "transport handle dropped");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        let _ = event_tx.send(TransportEvent {
            epoch,
            kind: TransportEventKind::Closed,
        });

        debug!(epoch, "transport event loop terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================
