// ── Command relay ──
//
// User intents leave the console through two paths: live messages over the
// device channel (best effort, dropped while disconnected) and one-shot
// POST requests whose outcome is reported as exactly one toast.

use serde_json::{Map, Value};
use tracing::{info, warn};

use dmxnode_api::{ConnectionManager, DeviceRequests, Endpoint, OutboundMessage};

use crate::error::CoreError;
use crate::fields::FormTarget;
use crate::notify::NotificationQueue;

// ── Command types ────────────────────────────────────────────────────

/// Device-level actions that need explicit confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum SystemCommandKind {
    Reboot,
    FactoryReset,
}

impl SystemCommandKind {
    pub fn endpoint(self) -> Endpoint {
        match self {
            Self::Reboot => Endpoint::Reboot,
            Self::FactoryReset => Endpoint::FactoryReset,
        }
    }

    /// Question put to the user before the request is sent.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Reboot => "确定要重启设备吗？",
            Self::FactoryReset => "确定要恢复出厂设置吗？所有配置将被清除！",
        }
    }

    /// Verb used in the success toast.
    pub fn label(self) -> &'static str {
        match self {
            Self::Reboot => "重启",
            Self::FactoryReset => "重置",
        }
    }
}

/// Everything the console can send to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundCommand {
    PixelTest {
        mode: i64,
    },
    FormSubmit {
        target: FormTarget,
        fields: Map<String, Value>,
    },
    SystemCommand {
        kind: SystemCommandKind,
    },
}

/// How a command left the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Sent,
    /// The user declined the confirmation; nothing was sent.
    Declined,
}

// ── Collaborators ────────────────────────────────────────────────────

/// Synchronous yes/no gate for destructive commands.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Fire-and-forget sink for live messages.
pub trait LiveChannel: Send + Sync {
    fn send_live(&self, message: &OutboundMessage);
}

impl LiveChannel for ConnectionManager {
    fn send_live(&self, message: &OutboundMessage) {
        self.send(message);
    }
}

// ── CommandChannel ───────────────────────────────────────────────────

pub struct CommandChannel<R, L> {
    requests: R,
    live: L,
    notifications: NotificationQueue,
}

impl<R, L> CommandChannel<R, L>
where
    R: DeviceRequests,
    L: LiveChannel,
{
    pub fn new(requests: R, live: L, notifications: NotificationQueue) -> Self {
        Self {
            requests,
            live,
            notifications,
        }
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    /// POST one form body to its endpoint.
    ///
    /// Reports the outcome as a single toast. The caller's field values are
    /// never touched here, so a failed submit leaves them as they were.
    pub async fn submit_form(
        &self,
        target: FormTarget,
        fields: Map<String, Value>,
    ) -> Result<(), CoreError> {
        let body = Value::Object(fields);
        let label = target.label();

        match self.requests.post(target.endpoint(), Some(&body)).await {
            Ok(()) => {
                info!(form = %target, "settings saved");
                self.notifications.success(format!("{label}设置已保存"));
                Ok(())
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(form = %target, error = %err, "settings submit failed");
                self.notifications
                    .error(format!("{label}设置保存失败: {}", err.reason()));
                Err(err)
            }
        }
    }

    /// Push a pixel test mode over the live channel. Dropped while
    /// disconnected.
    pub fn set_pixel_test(&self, mode: i64) {
        self.live.send_live(&OutboundMessage::PixelTest { mode });
    }

    /// Confirm, then POST a body-less system command.
    pub async fn system_command(
        &self,
        kind: SystemCommandKind,
        confirm: &impl Confirm,
    ) -> Result<CommandOutcome, CoreError> {
        if !confirm.confirm(kind.prompt()) {
            info!(command = %kind, "system command declined");
            return Ok(CommandOutcome::Declined);
        }

        match self.requests.post(kind.endpoint(), None).await {
            Ok(()) => {
                info!(command = %kind, "system command sent");
                self.notifications
                    .success(format!("{}命令已发送", kind.label()));
                Ok(CommandOutcome::Sent)
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(command = %kind, error = %err, "system command failed");
                self.notifications
                    .error(format!("命令发送失败: {}", err.reason()));
                Err(err)
            }
        }
    }

    /// Route any [`OutboundCommand`].
    pub async fn execute(
        &self,
        command: OutboundCommand,
        confirm: &impl Confirm,
    ) -> Result<CommandOutcome, CoreError> {
        match command {
            OutboundCommand::PixelTest { mode } => {
                self.set_pixel_test(mode);
                Ok(CommandOutcome::Sent)
            }
            OutboundCommand::FormSubmit { target, fields } => {
                self.submit_form(target, fields).await?;
                Ok(CommandOutcome::Sent)
            }
            OutboundCommand::SystemCommand { kind } => self.system_command(kind, confirm).await,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
