//! Scripted transports for exercising the connection lifecycle.
//!
//! [`FakeDialer`] stands in for the production dialer: each queued script
//! either refuses the dial or accepts it with an in-memory socket whose
//! server end the test drives through [`ServerEnd`].

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::pin::Pin;
use std::result::Result as StdResult;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::channel::mpsc as futures_mpsc;
use futures_util::Sink;
use parking_lot::Mutex;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use url::Url;

use crate::error::{Error, Result};

use super::dialer::{Dialer, WsSink, WsSource};

// ============================================================================
// Types
// ============================================================================

type ServerFrame = StdResult<Message, WsError>;

// ============================================================================
// Tracing
// ============================================================================

/// Installs a subscriber once so `RUST_LOG=debug cargo test` shows the
/// dispatch and transport tracing.
pub(crate) fn init_tracing() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// DialScript
// ============================================================================

/// One scripted dial outcome.
enum DialScript {
    /// Fail the dial.
    Refuse,

    /// Never resolve the dial, pinning the client in `Connecting`.
    Hang,

    /// Accept the dial with an in-memory socket.
    Accept {
        sent: Arc<Mutex<Vec<Message>>>,
        frames_rx: futures_mpsc::UnboundedReceiver<ServerFrame>,
    },
}

// ============================================================================
// ServerEnd
// ============================================================================

/// Test-side handle to one accepted in-memory socket.
pub(crate) struct ServerEnd {
    frames_tx: futures_mpsc::UnboundedSender<ServerFrame>,
    sent: Arc<Mutex<Vec<Message>>>,
}

impl ServerEnd {
    /// Delivers a text frame to the client.
    pub(crate) fn push_text(&self, text: &str) {
        let _ = self
            .frames_tx
            .unbounded_send(Ok(Message::Text(text.to_string().into())));
    }

    /// Ends the socket, as a dropped connection would.
    pub(crate) fn close(&self) {
        self.frames_tx.close_channel();
    }

    /// Returns every text frame the client transmitted.
    pub(crate) fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|message| match message {
                Message::Text(text) => Some(text.to_string()),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// CapturingSink
// ============================================================================

/// Sink that records transmitted frames instead of writing to a socket.
struct CapturingSink {
    sent: Arc<Mutex<Vec<Message>>>,
}

impl Sink<Message> for CapturingSink {
    type Error = WsError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<StdResult<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> StdResult<(), WsError> {
        self.sent.lock().push(item);
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<StdResult<(), WsError>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<StdResult<(), WsError>> {
        Poll::Ready(Ok(()))
    }
}

// ============================================================================
// FakeDialer
// ============================================================================

/// Dialer that plays back queued scripts.
///
/// Dials beyond the queued scripts are refused, so a runaway reconnect
/// shows up as extra recorded dials rather than a hang.
pub(crate) struct FakeDialer {
    scripts: Mutex<VecDeque<DialScript>>,
    dialed: Mutex<Vec<Url>>,
}

impl FakeDialer {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            dialed: Mutex::new(Vec::new()),
        }
    }

    /// Queues a refused dial.
    pub(crate) fn expect_refuse(&self) {
        self.scripts.lock().push_back(DialScript::Refuse);
    }

    /// Queues `count` refused dials.
    pub(crate) fn expect_refusals(&self, count: usize) {
        for _ in 0..count {
            self.expect_refuse();
        }
    }

    /// Queues a dial that never resolves.
    pub(crate) fn expect_hang(&self) {
        self.scripts.lock().push_back(DialScript::Hang);
    }

    /// Queues an accepted dial and returns its server end.
    pub(crate) fn expect_accept(&self) -> ServerEnd {
        let (frames_tx, frames_rx) = futures_mpsc::unbounded();
        let sent = Arc::new(Mutex::new(Vec::new()));

        self.scripts.lock().push_back(DialScript::Accept {
            sent: Arc::clone(&sent),
            frames_rx,
        });

        ServerEnd { frames_tx, sent }
    }

    /// Returns every URL dialed so far.
    pub(crate) fn dialed(&self) -> Vec<Url> {
        self.dialed.lock().clone()
    }

    /// Returns the number of dials so far.
    pub(crate) fn dial_count(&self) -> usize {
        self.dialed.lock().len()
    }
}

#[async_trait]
impl Dialer for FakeDialer {
    async fn dial(&self, url: &Url) -> Result<(WsSink, WsSource)> {
        self.dialed.lock().push(url.clone());

        let script = self.scripts.lock().pop_front();
        match script {
            Some(DialScript::Accept { sent, frames_rx }) => {
                let sink = CapturingSink { sent };
                Ok((Box::new(sink), Box::new(frames_rx)))
            }
            Some(DialScript::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            Some(DialScript::Refuse) | None => {
                Err(Error::connection("dial refused by test script"))
            }
        }
    }
}
