//! Device channel with bounded auto-reconnect.
//!
//! Connects to the device's `/ws` endpoint and streams decoded
//! [`InboundMessage`]s through a [`tokio::sync::broadcast`] channel. After a
//! close the loop retries a fixed number of times with a fixed delay, then
//! stays disconnected until [`ConnectionManager::restart`] is called.
//!
//! # Example
//!
//! ```rust,ignore
//! use dmxnode_api::transport::TlsMode;
//! use dmxnode_api::websocket::{ConnectionManager, ReconnectPolicy};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let origin = Url::parse("http://192.168.4.1")?;
//! let conn = ConnectionManager::connect(
//!     &origin,
//!     ReconnectPolicy::default(),
//!     TlsMode::DangerAcceptInvalid,
//!     CancellationToken::new(),
//! )?;
//! let mut rx = conn.subscribe();
//!
//! while let Ok(msg) = rx.recv().await {
//!     println!("{}", msg.kind());
//! }
//!
//! conn.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::Connector;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::message::InboundMessage;
use crate::transport::{TlsMode, ws_connector};

// ── Broadcast channel capacity ───────────────────────────────────────

const MESSAGE_CHANNEL_CAPACITY: usize = 256;

/// Retries after a close before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Fixed wait between a close and the next connect.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

// ── ReconnectPolicy ──────────────────────────────────────────────────

/// Bounded, fixed-delay reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Retries allowed between two successful opens.
    pub max_attempts: u32,

    /// Delay before each retry.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the next retry, or `None` once `attempt_count` has
    /// reached the cap.
    pub fn next_delay(&self, attempt_count: u32) -> Option<Duration> {
        (attempt_count < self.max_attempts).then_some(self.delay)
    }
}

// ── ConnectionState ──────────────────────────────────────────────────

/// Channel state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

// ── ConnectionLifecycle ──────────────────────────────────────────────

/// Pure state machine behind the connection loop.
///
/// `attempt_count` only grows between opens and drops to zero exactly once
/// per successful open.
#[derive(Debug, Clone)]
pub struct ConnectionLifecycle {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempt_count: u32,
}

impl ConnectionLifecycle {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempt_count: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    pub fn on_connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    pub fn on_open(&mut self) {
        self.state = ConnectionState::Connected;
        self.attempt_count = 0;
    }

    /// Transport error. Only changes state; the retry comes from the close
    /// that always follows.
    pub fn on_error(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Connection ended. Returns the delay for the next retry, if any.
    pub fn on_close(&mut self) -> Option<Duration> {
        self.state = ConnectionState::Disconnected;
        let delay = self.policy.next_delay(self.attempt_count)?;
        self.attempt_count += 1;
        Some(delay)
    }

    /// Whether the retry budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.policy.next_delay(self.attempt_count).is_none()
    }

    /// External trigger: start a fresh retry cycle.
    pub fn restart(&mut self) {
        self.attempt_count = 0;
    }
}

// ── Channel URL ──────────────────────────────────────────────────────

/// Derive the channel URL from the device origin: `/ws` on the same
/// host, `wss` iff the origin is `https`.
pub fn ws_url_for(origin: &Url) -> Result<Url, Error> {
    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(Error::UnsupportedScheme(other.into())),
    };

    let mut url = origin.join("/ws")?;
    url.set_query(None);
    url.set_fragment(None);
    url.set_scheme(scheme)
        .map_err(|()| Error::UnsupportedScheme(origin.scheme().into()))?;
    Ok(url)
}

// ── ConnectionManager ────────────────────────────────────────────────

/// Handle to the running device channel.
///
/// Cheaply cloneable. Call [`shutdown`](Self::shutdown) to tear down the
/// background task.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    state_rx: watch::Receiver<ConnectionState>,
    message_tx: broadcast::Sender<Arc<InboundMessage>>,
    outbound_tx: mpsc::UnboundedSender<String>,
    restart_tx: Arc<watch::Sender<u64>>,
    cancel: CancellationToken,
}

impl ConnectionManager {
    /// Derive the channel URL from `origin` and spawn the connection loop.
    ///
    /// `tls` applies to `https` origins only. Returns immediately; the first
    /// connect happens asynchronously. Subscribe right away so no early
    /// frame is missed.
    pub fn connect(
        origin: &Url,
        policy: ReconnectPolicy,
        tls: TlsMode,
        cancel: CancellationToken,
    ) -> Result<Self, Error> {
        let ws_url = ws_url_for(origin)?;
        let connector = if ws_url.scheme() == "wss" {
            ws_connector(tls)?
        } else {
            None
        };

        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (message_tx, _) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (restart_tx, restart_rx) = watch::channel(0_u64);

        let task = ConnectionTask {
            ws_url,
            connector,
            lifecycle: ConnectionLifecycle::new(policy),
            state_tx,
            message_tx: message_tx.clone(),
            outbound_rx,
            restart_rx,
            cancel: cancel.clone(),
        };
        tokio::spawn(task.run());

        Ok(Self {
            state_rx,
            message_tx,
            outbound_tx,
            restart_tx: Arc::new(restart_tx),
            cancel,
        })
    }

    /// Current channel state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch receiver for state changes.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// New receiver for decoded inbound messages.
    ///
    /// A consumer that falls behind receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<InboundMessage>> {
        self.message_tx.subscribe()
    }

    /// Best-effort send: transmitted only while connected, silently dropped
    /// otherwise. Nothing is buffered across connections.
    pub fn send<T: Serialize>(&self, payload: &T) {
        if !self.state().is_connected() {
            tracing::debug!("channel not connected, dropping outbound message");
            return;
        }

        match serde_json::to_string(payload) {
            Ok(text) => {
                if self.outbound_tx.send(text).is_err() {
                    tracing::debug!("connection loop gone, dropping outbound message");
                }
            }
            Err(e) => {
                let err = Error::from(e);
                tracing::warn!(error = %err, "dropping outbound message");
            }
        }
    }

    /// Re-arm the retry budget after it ran out. Requests made before the
    /// budget is spent (while connected or still retrying) are ignored.
    pub fn restart(&self) {
        self.restart_tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background connection loop ───────────────────────────────────────

struct ConnectionTask {
    ws_url: Url,
    connector: Option<Connector>,
    lifecycle: ConnectionLifecycle,
    state_tx: watch::Sender<ConnectionState>,
    message_tx: broadcast::Sender<Arc<InboundMessage>>,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    restart_rx: watch::Receiver<u64>,
    cancel: CancellationToken,
}

impl ConnectionTask {
    /// Main loop: connect → read → on close, wait → reconnect.
    async fn run(mut self) {
        loop {
            self.lifecycle.on_connecting();
            self.publish();

            if let Err(e) = self.connect_and_read().await {
                tracing::warn!(error = %e, attempt = self.lifecycle.attempt_count(), "channel error");
                self.lifecycle.on_error();
                self.publish();
            }
            if self.cancel.is_cancelled() {
                break;
            }

            let retry = self.lifecycle.on_close();
            self.publish();
            self.discard_outbound();

            match retry {
                Some(delay) => {
                    tracing::info!(
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        attempt = self.lifecycle.attempt_count(),
                        max_attempts = self.lifecycle.policy().max_attempts,
                        "waiting before reconnect"
                    );
                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => break,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    tracing::error!(
                        max_attempts = self.lifecycle.policy().max_attempts,
                        "reconnection limit reached, waiting for restart"
                    );
                    // Only a request made from here on counts.
                    let _ = self.restart_rx.borrow_and_update();
                    tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => break,
                        changed = self.restart_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            tracing::info!("restart requested");
                            self.lifecycle.restart();
                        }
                    }
                }
            }
        }

        self.lifecycle.on_error();
        self.publish();
        tracing::debug!("connection loop exiting");
    }

    /// Establish one connection and pump frames until it drops.
    ///
    /// `Ok(())` means a clean end (close frame, stream end, or shutdown).
    async fn connect_and_read(&mut self) -> Result<(), Error> {
        tracing::info!(url = %self.ws_url, "connecting to device channel");

        let connected = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Ok(()),
            result = tokio_tungstenite::connect_async_tls_with_config(
                self.ws_url.as_str(),
                None,
                false,
                self.connector.clone(),
            ) => result,
        };
        let (ws_stream, _response) =
            connected.map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        self.lifecycle.on_open();
        self.publish();
        tracing::info!("device channel connected");

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                Some(text) = self.outbound_rx.recv() => {
                    write
                        .send(Message::text(text))
                        .await
                        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            decode_and_broadcast(text.as_str(), &self.message_tx);
                        }
                        Some(Ok(Message::Ping(_))) => {
                            // tungstenite queues the pong reply itself
                            tracing::trace!("channel ping");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            if let Some(ref cf) = frame {
                                tracing::info!(
                                    code = %cf.code,
                                    reason = %cf.reason,
                                    "close frame received"
                                );
                            } else {
                                tracing::info!("close frame received (no payload)");
                            }
                            return Ok(());
                        }
                        Some(Err(e)) => {
                            return Err(Error::WebSocketConnect(e.to_string()));
                        }
                        None => {
                            tracing::info!("channel stream ended");
                            return Ok(());
                        }
                        _ => {
                            // Binary, Pong, Frame -- ignore
                        }
                    }
                }
            }
        }
    }

    fn publish(&self) {
        let state = self.lifecycle.state();
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            tracing::debug!(?state, "connection state changed");
        }
    }

    /// Anything queued while the connection was going down is stale.
    fn discard_outbound(&mut self) {
        let mut dropped = 0_usize;
        while self.outbound_rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "discarded outbound messages from closed connection");
        }
    }
}

// ── Frame decoding ───────────────────────────────────────────────────

/// Decode one text frame and broadcast it. Malformed frames are logged and
/// dropped; they never affect the connection.
fn decode_and_broadcast(text: &str, message_tx: &broadcast::Sender<Arc<InboundMessage>>) {
    match InboundMessage::decode(text) {
        Ok(message) => {
            tracing::trace!(kind = message.kind(), "frame received");
            // Ignore send errors -- just means no active subscribers right now
            let _ = message_tx.send(Arc::new(message));
        }
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed frame");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
