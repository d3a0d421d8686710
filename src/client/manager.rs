//! Connection manager and dispatch loop.
//!
//! [`ChatClient`] is a cheap-to-clone handle; all connection state lives in
//! a single spawned dispatch task. The task multiplexes three inputs:
//!
//! - caller commands (select session, send, close)
//! - transport lifecycle events (open, frame, close), tagged with an epoch
//! - reconnect timer fires, delivered as internal redial commands
//!
//! # State Machine
//!
//! ```text
//!             select_session
//!     Idle ───────────────────► Connecting ──open──► Open
//!                                   ▲                  │
//!                                   │ redial           │ close
//!                    backoff        │                  ▼
//!     Closed(Final) ◄───────── Closed(WillReconnect) ◄─┘
//!       (ceiling hit,                │
//!        or reconnect forbidden)     │ attempts < max
//!                                    └── timer scheduled
//! ```
//!
//! # Epochs
//!
//! Every dial increments the epoch. Transport events and reconnect timers
//! carry the epoch they were created under; the loop drops anything stale.
//! This is what neutralizes a superseded transport and invalidates pending
//! reconnect timers across a session switch.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, WeakUnboundedSender};
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::history;
use crate::protocol::{Inbound, Outbound};
use crate::session::{Endpoints, SessionId};
use crate::transport::{Dialer, Transport, TransportEvent, TransportEventKind};

use super::builder::ClientBuilder;
use super::event::{ClientEvent, CloseKind, ConnectionState};
use super::reconnect::ReconnectState;

// ============================================================================
// Command
// ============================================================================

/// Commands from handles (and reconnect timers) to the dispatch loop.
enum Command {
    /// Make a session active, tearing down any current transport.
    Select {
        session: SessionId,
    },

    /// Transmit a chat message or control signal over the open transport.
    Send {
        signal: Outbound,
        ack: oneshot::Sender<Result<()>>,
    },

    /// A reconnect timer fired for the given epoch.
    Redial {
        session: SessionId,
        epoch: u64,
    },

    /// Disable reconnection and close the current transport.
    Close,
}

// ============================================================================
// Shared
// ============================================================================

/// Handle-visible snapshot of the dispatch loop state.
struct Shared {
    /// Active session, if any.
    session: Option<SessionId>,

    /// Current connection state.
    state: ConnectionState,
}

// ============================================================================
// ChatClient
// ============================================================================

/// Handle to a running chat client.
///
/// Cloning is cheap; every clone drives the same dispatch loop. The loop
/// terminates once every handle has been dropped.
///
/// # Example
///
/// ```no_run
/// use chatsocket::{ChatClient, ClientEvent, SessionId};
///
/// # async fn example() -> chatsocket::Result<()> {
/// let (client, mut events) = ChatClient::builder()
///     .base_url("https://chat.example")
///     .build()?;
///
/// client.select_session(SessionId::new(1))?;
///
/// while let Some(event) = events.recv().await {
///     match event {
///         ClientEvent::Message(message) => {
///             println!("{}: {}", message.role, message.content);
///         }
///         _ => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatClient {
    /// Channel into the dispatch loop.
    command_tx: mpsc::UnboundedSender<Command>,

    /// Renderer event channel (shared with the dispatch loop).
    event_tx: mpsc::UnboundedSender<ClientEvent>,

    /// Endpoint factory for the configured origin.
    endpoints: Endpoints,

    /// HTTP client for the history endpoint.
    http: reqwest::Client,

    /// Snapshot of the loop state.
    shared: Arc<Mutex<Shared>>,
}

impl ChatClient {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Spawns the dispatch loop. Called by [`ClientBuilder::build`].
    pub(crate) fn spawn(
        endpoints: Endpoints,
        dialer: Arc<dyn Dialer>,
        initial_backoff: Duration,
        max_attempts: u32,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Mutex::new(Shared {
            session: None,
            state: ConnectionState::Idle,
        }));

        let dispatch = DispatchLoop {
            endpoints: endpoints.clone(),
            dialer,
            reconnect: ReconnectState::new(initial_backoff, max_attempts),
            epoch: 0,
            session: None,
            transport: None,
            state: ConnectionState::Idle,
            pending_approval: false,
            command_weak: command_tx.downgrade(),
            command_rx,
            event_tx: event_tx.clone(),
            transport_tx,
            transport_rx,
            shared: Arc::clone(&shared),
        };

        tokio::spawn(dispatch.run());

        let client = Self {
            command_tx,
            event_tx,
            endpoints,
            http: reqwest::Client::new(),
            shared,
        };

        (client, event_rx)
    }

    /// Makes a session active.
    ///
    /// Any current transport is closed first (with reconnection disabled if
    /// it was open), then exactly one new transport is dialed. Completion is
    /// signaled through [`ClientEvent::StateChanged`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClientStopped`] if the dispatch loop has stopped.
    pub fn select_session(&self, session: impl Into<SessionId>) -> Result<()> {
        self.command_tx
            .send(Command::Select {
                session: session.into(),
            })
            .map_err(|_| Error::ClientStopped)
    }

    /// Sends a chat message over the active session.
    ///
    /// Leading and trailing whitespace is trimmed; a message that trims to
    /// empty is a silent no-op. Messages are never queued: without an open
    /// transport the send is rejected.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no transport is open
    /// - [`Error::ClientStopped`] if the dispatch loop has stopped
    pub async fn send_chat(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        self.submit(Outbound::chat(trimmed)).await
    }

    /// Asks the server to run the AI over the session.
    ///
    /// # Errors
    ///
    /// Same as [`ChatClient::send_chat`].
    pub async fn invoke_ai(&self) -> Result<()> {
        self.submit(Outbound::InvokeAi).await
    }

    /// Asks the server to execute the pending function call.
    ///
    /// # Errors
    ///
    /// Same as [`ChatClient::send_chat`].
    pub async fn invoke_function(&self) -> Result<()> {
        self.submit(Outbound::InvokeFunction).await
    }

    /// Approves the pending function call.
    ///
    /// This is the approval affordance's action: it transmits the
    /// invoke-function signal. The affordance itself is cleared by the next
    /// inbound message ([`ClientEvent::ApprovalCleared`]).
    ///
    /// # Errors
    ///
    /// Same as [`ChatClient::send_chat`].
    pub async fn approve_function(&self) -> Result<()> {
        self.invoke_function().await
    }

    /// Fetches the message history for a session and emits it as
    /// [`ClientEvent::History`].
    ///
    /// Independent of the socket lifecycle; typically called alongside
    /// [`ChatClient::select_session`] to repopulate the message list.
    ///
    /// # Errors
    ///
    /// - [`Error::Http`] if the request fails or the server responds with
    ///   an error status
    /// - [`Error::ClientStopped`] if the event receiver is gone
    pub async fn fetch_history(&self, session: impl Into<SessionId>) -> Result<()> {
        let session = session.into();
        let messages = history::fetch(&self.http, &self.endpoints, session).await?;

        self.event_tx
            .send(ClientEvent::History { session, messages })
            .map_err(|_| Error::ClientStopped)
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    /// Returns the active session, if any.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        self.shared.lock().session
    }

    /// Disables reconnection and closes the current transport.
    ///
    /// The final state change ([`CloseKind::Final`]) arrives through the
    /// event stream once the socket has shut down.
    pub fn close(&self) {
        let _ = self.command_tx.send(Command::Close);
    }

    /// Submits a signal and waits for the dispatch loop's verdict.
    async fn submit(&self, signal: Outbound) -> Result<()> {
        let (ack, ack_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Send { signal, ack })
            .map_err(|_| Error::ClientStopped)?;

        ack_rx.await.map_err(|_| Error::ClientStopped)?
    }
}

// ============================================================================
// DispatchLoop
// ============================================================================

/// The dispatch task owning all connection state.
struct DispatchLoop {
    /// Endpoint factory.
    endpoints: Endpoints,

    /// Socket establishment seam.
    dialer: Arc<dyn Dialer>,

    /// Backoff counters and the reconnection-permitted flag.
    reconnect: ReconnectState,

    /// Current transport generation. Incremented per dial.
    epoch: u64,

    /// Active session.
    session: Option<SessionId>,

    /// Current transport, if any.
    transport: Option<Transport>,

    /// Current connection state.
    state: ConnectionState,

    /// Whether an approval affordance is pending at the renderer.
    pending_approval: bool,

    /// Weak command sender for reconnect timers. Weak so the loop still
    /// ends once every handle is dropped.
    command_weak: WeakUnboundedSender<Command>,

    /// Command input.
    command_rx: mpsc::UnboundedReceiver<Command>,

    /// Renderer event output.
    event_tx: mpsc::UnboundedSender<ClientEvent>,

    /// Event sender handed to each dialed transport.
    transport_tx: mpsc::UnboundedSender<TransportEvent>,

    /// Transport event input.
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,

    /// Snapshot shared with handles.
    shared: Arc<Mutex<Shared>>,
}

impl DispatchLoop {
    /// Runs until every client handle has been dropped.
    async fn run(mut self) {
        debug!("dispatch loop started");

        loop {
            tokio::select! {
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => break,
                    }
                }

                event = self.transport_rx.recv() => {
                    // The loop holds a sender clone, so this arm never
                    // observes a closed channel.
                    if let Some(event) = event {
                        self.handle_transport_event(event);
                    }
                }
            }
        }

        if let Some(transport) = self.transport.take() {
            transport.shutdown();
        }

        debug!("dispatch loop terminated");
    }

    /// Handles one caller command.
    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Select { session } => {
                info!(%session, "session selected");
                self.connect(session);
            }

            Command::Send { signal, ack } => {
                let result = self.transmit(signal);
                let _ = ack.send(result);
            }

            Command::Redial { session, epoch } => self.handle_redial(session, epoch),

            Command::Close => {
                info!("explicit close requested");
                self.reconnect.forbid();
                if let Some(transport) = &self.transport {
                    transport.shutdown();
                } else if let Some(session) = self.session
                    && self.state == ConnectionState::Closed(CloseKind::WillReconnect)
                {
                    // No socket to close; just end the backoff window so a
                    // pending timer cannot redial.
                    self.set_state(session, ConnectionState::Closed(CloseKind::Final));
                }
            }
        }
    }

    /// Dials a transport for the session, superseding any current one.
    fn connect(&mut self, session: SessionId) {
        if let Some(old) = self.transport.take() {
            // A superseded open transport must not reconnect itself; its
            // close is also dropped as stale once the epoch advances.
            if self.state == ConnectionState::Open {
                self.reconnect.forbid();
            }
            old.shutdown();
        }

        self.epoch += 1;
        self.session = Some(session);

        let url = self.endpoints.socket_url(session);
        debug!(%session, epoch = self.epoch, %url, "dialing chat socket");

        self.transport = Some(Transport::dial(
            Arc::clone(&self.dialer),
            url,
            self.epoch,
            self.transport_tx.clone(),
        ));

        self.set_state(session, ConnectionState::Connecting);
    }

    /// Handles a reconnect timer fire.
    fn handle_redial(&mut self, session: SessionId, epoch: u64) {
        if epoch != self.epoch {
            debug!(
                timer_epoch = epoch,
                current_epoch = self.epoch,
                "ignoring stale reconnect timer"
            );
            return;
        }

        if self.state != ConnectionState::Closed(CloseKind::WillReconnect) {
            debug!(state = %self.state, "reconnect timer fired outside backoff window");
            return;
        }

        self.connect(session);
    }

    /// Handles one transport lifecycle event.
    fn handle_transport_event(&mut self, event: TransportEvent) {
        if event.epoch != self.epoch {
            debug!(
                event_epoch = event.epoch,
                current_epoch = self.epoch,
                "dropping event from superseded transport"
            );
            return;
        }

        match event.kind {
            TransportEventKind::Opened => self.handle_open(),
            TransportEventKind::Frame(text) => self.handle_frame(&text),
            TransportEventKind::Closed => self.handle_close(),
        }
    }

    /// The current transport opened.
    fn handle_open(&mut self) {
        let Some(session) = self.session else { return };

        info!(%session, "chat socket connected");
        self.reconnect.on_open();
        self.set_state(session, ConnectionState::Open);
    }

    /// The current transport closed. Every close looks the same here:
    /// remote close, network failure, failed dial, and local shutdown all
    /// arrive as one `Closed` event.
    fn handle_close(&mut self) {
        let Some(session) = self.session else { return };

        self.transport = None;
        info!(%session, "chat socket disconnected");

        if !self.reconnect.is_permitted() {
            self.set_state(session, ConnectionState::Closed(CloseKind::Final));
            return;
        }

        match self.reconnect.next_attempt() {
            Some(attempt) => {
                info!(
                    attempt = attempt.attempt,
                    delay_ms = attempt.delay.as_millis() as u64,
                    "scheduling reconnect"
                );
                self.set_state(session, ConnectionState::Closed(CloseKind::WillReconnect));
                self.schedule_redial(session, attempt.delay);
            }
            None => {
                warn!(%session, "maximum reconnect attempts reached, giving up");
                self.set_state(session, ConnectionState::Closed(CloseKind::Final));
            }
        }
    }

    /// Spawns the reconnect timer for the current epoch.
    ///
    /// The timer cannot be cancelled; it is invalidated instead. If another
    /// dial happens before it fires, the epoch check in
    /// [`DispatchLoop::handle_redial`] discards it.
    fn schedule_redial(&self, session: SessionId, delay: Duration) {
        let Some(command_tx) = self.command_weak.upgrade() else {
            return;
        };
        let epoch = self.epoch;

        tokio::spawn(async move {
            sleep(delay).await;
            let _ = command_tx.send(Command::Redial { session, epoch });
        });
    }

    /// Handles one inbound frame.
    fn handle_frame(&mut self, text: &str) {
        // Every inbound frame clears a pending approval affordance before
        // being processed; a newer request may immediately replace it.
        if self.pending_approval {
            self.pending_approval = false;
            self.emit(ClientEvent::ApprovalCleared);
        }

        match Inbound::parse(text) {
            Ok(Inbound::Chat(message)) => {
                self.emit(ClientEvent::Message(message));
            }

            Ok(Inbound::FunctionCall {
                approval_required: false,
            }) => {
                debug!("function call pre-approved, invoking");
                if let Err(e) = self.transmit(Outbound::InvokeFunction) {
                    warn!(error = %e, "failed to auto-invoke function");
                }
            }

            Ok(Inbound::FunctionCall {
                approval_required: true,
            }) => {
                self.pending_approval = true;
                self.emit(ClientEvent::ApprovalRequested);
            }

            Err(e) => {
                warn!(error = %e, "dropping malformed chat frame");
            }
        }
    }

    /// Transmits a signal over the open transport.
    fn transmit(&mut self, signal: Outbound) -> Result<()> {
        if self.state != ConnectionState::Open {
            return Err(Error::NotConnected);
        }

        let Some(transport) = &self.transport else {
            return Err(Error::NotConnected);
        };

        debug!(kind = signal.kind(), "transmitting");
        transport.send(signal.into_message()?)
    }

    /// Records a state change and notifies the renderer.
    fn set_state(&mut self, session: SessionId, state: ConnectionState) {
        self.state = state;

        {
            let mut shared = self.shared.lock();
            shared.session = Some(session);
            shared.state = state;
        }

        self.emit(ClientEvent::StateChanged { session, state });
    }

    /// Emits a renderer event. A dropped receiver just means nothing is
    /// rendering; the connection lifecycle continues.
    fn emit(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event);
    }
}

// ============================================================================
// Tests
// ============================================================================
