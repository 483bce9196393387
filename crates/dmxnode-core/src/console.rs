// ── Console runtime ──
//
// Ties the device channel, dispatcher, field adapter and command relay
// together. One background task applies inbound messages to the shared
// state in arrival order; handlers are synchronous and never hold the state
// across an await.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dmxnode_api::{ConnectionManager, ConnectionState, DeviceRequests, InboundMessage, RequestClient};

use crate::command::{CommandChannel, CommandOutcome, Confirm, SystemCommandKind};
use crate::config::ConsoleConfig;
use crate::dispatch::MessageDispatcher;
use crate::error::CoreError;
use crate::fields::{AP_ENABLED_KEY, DHCP_KEY, FieldValue, FormTarget};
use crate::notify::{NotificationQueue, Toast};
use crate::state::ConsoleState;

const PIXEL_TEST_KEY: &str = "pixelTest";

// ── Console ──────────────────────────────────────────────────────────

/// The main entry point for front ends.
///
/// Cheaply cloneable via `Arc<ConsoleInner>`. Call
/// [`shutdown()`](Self::shutdown) to stop the background tasks.
pub struct Console<R = RequestClient> {
    inner: Arc<ConsoleInner<R>>,
}

impl<R> Clone for Console<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ConsoleInner<R> {
    config: ConsoleConfig,
    state: Arc<watch::Sender<ConsoleState>>,
    connection: ConnectionManager,
    commands: CommandChannel<R, ConnectionManager>,
    cancel: CancellationToken,
    event_task: Mutex<Option<JoinHandle<()>>>,
}

impl Console<RequestClient> {
    /// Connect to the device in `config` over HTTP and WebSocket.
    ///
    /// Returns once the background tasks are running; the first connect
    /// happens asynchronously. Must be called from within a Tokio runtime.
    pub fn start(config: ConsoleConfig) -> Result<Self, CoreError> {
        let requests = RequestClient::new(config.device.clone(), &config.transport())?;
        Self::start_with(config, requests)
    }
}

impl<R: DeviceRequests> Console<R> {
    /// Start with a custom request collaborator.
    pub fn start_with(config: ConsoleConfig, requests: R) -> Result<Self, CoreError> {
        let cancel = CancellationToken::new();
        let connection = ConnectionManager::connect(
            &config.device,
            config.reconnect,
            config.tls,
            cancel.child_token(),
        )
        .map_err(|e| CoreError::ConnectionFailed {
            url: config.device.to_string(),
            reason: e.to_string(),
        })?;

        let (state, _) = watch::channel(ConsoleState::new());
        let state = Arc::new(state);

        let task = tokio::spawn(event_loop(
            Arc::clone(&state),
            connection.subscribe(),
            connection.state_changes(),
            cancel.clone(),
        ));

        let notifications = NotificationQueue::new(config.toast_ttl);
        let commands = CommandChannel::new(requests, connection.clone(), notifications);

        info!(device = %config.device, "console started");

        Ok(Self {
            inner: Arc::new(ConsoleInner {
                config,
                state,
                connection,
                commands,
                cancel,
                event_task: Mutex::new(Some(task)),
            }),
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    // ── State observation ────────────────────────────────────────────

    /// Copy of the current console state.
    pub fn snapshot(&self) -> ConsoleState {
        self.inner.state.borrow().clone()
    }

    /// Watch receiver notified on every state revision.
    pub fn state_changes(&self) -> watch::Receiver<ConsoleState> {
        self.inner.state.subscribe()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.state_changes()
    }

    /// Transient notifications produced by commands.
    pub fn notifications(&self) -> &NotificationQueue {
        self.inner.commands.notifications()
    }

    pub fn toasts(&self) -> watch::Receiver<Option<Toast>> {
        self.notifications().subscribe()
    }

    /// Wait until the device channel is open.
    pub async fn wait_connected(&self, timeout: Duration) -> Result<(), CoreError> {
        let mut rx = self.connection_state();
        match tokio::time::timeout(timeout, rx.wait_for(|s| s.is_connected())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(CoreError::Disconnected),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
                waiting_for: "device connection",
            }),
        }
    }

    /// Wait until the first configuration snapshot has been applied and
    /// return the state at that point.
    pub async fn wait_for_config(&self, timeout: Duration) -> Result<ConsoleState, CoreError> {
        let mut rx = self.state_changes();
        match tokio::time::timeout(timeout, rx.wait_for(|s| s.config_received)).await {
            Ok(Ok(state)) => Ok(state.clone()),
            Ok(Err(_)) => Err(CoreError::Disconnected),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
                waiting_for: "device configuration",
            }),
        }
    }

    // ── Local edits ──────────────────────────────────────────────────

    /// Apply user input to a field and re-derive any panel it controls.
    pub fn edit(&self, key: &str, raw: &str) -> Result<FieldValue, CoreError> {
        let mut result = Err(CoreError::UnknownField { key: key.to_owned() });

        self.inner.state.send_if_modified(|state| {
            let edited = match state.fields.edit(key, raw) {
                Ok(binding) => (binding.key, binding.value.clone()),
                Err(e) => {
                    result = Err(e);
                    return false;
                }
            };

            match edited.0 {
                DHCP_KEY => state.derive_static_ip_visibility(),
                AP_ENABLED_KEY => state.derive_ap_panel_visibility(),
                _ => {}
            }
            debug!(key = edited.0, value = %edited.1, "field edited");
            result = Ok(edited.1);
            true
        });

        result
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Submit the current values of `target`'s fields.
    pub async fn submit_form(&self, target: FormTarget) -> Result<(), CoreError> {
        let fields = self.inner.state.borrow().fields.collect_form(target);
        let ap_enabled = fields.get("enabled").and_then(serde_json::Value::as_bool);

        self.inner.commands.submit_form(target, fields).await?;

        if target == FormTarget::Ap && ap_enabled == Some(true) {
            self.inner.state.send_modify(|state| state.ap.panel_visible = true);
        }
        Ok(())
    }

    /// Select a pixel test mode and push it to the device.
    pub fn set_pixel_test(&self, mode: i64) {
        self.inner.state.send_modify(|state| {
            state
                .fields
                .apply_remote(PIXEL_TEST_KEY, &serde_json::Value::from(mode));
        });
        self.inner.commands.set_pixel_test(mode);
    }

    pub async fn system_command(
        &self,
        kind: SystemCommandKind,
        confirm: &impl Confirm,
    ) -> Result<CommandOutcome, CoreError> {
        self.inner.commands.system_command(kind, confirm).await
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Re-arm the reconnect budget after it ran out.
    pub fn restart(&self) {
        self.inner.connection.restart();
    }

    /// Stop the device channel and the event loop.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(task) = self.inner.event_task.lock().await.take() {
            let _ = task.await;
        }
        debug!("console stopped");
    }
}

// ── Event loop ───────────────────────────────────────────────────────

/// Apply inbound messages and connection changes to the state, one at a
/// time.
async fn event_loop(
    state: Arc<watch::Sender<ConsoleState>>,
    mut messages: broadcast::Receiver<Arc<InboundMessage>>,
    mut connection: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
) {
    let dispatcher = MessageDispatcher;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *connection.borrow_and_update();
                state.send_if_modified(|s| {
                    let modified = s.connection != current;
                    s.connection = current;
                    modified
                });
            }
            received = messages.recv() => match received {
                Ok(message) => {
                    state.send_modify(|s| dispatcher.dispatch(s, &message));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "console fell behind the device channel");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    state.send_modify(|s| s.connection = ConnectionState::Disconnected);
}
