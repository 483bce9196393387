// dmxnode-core: console state, message dispatch and command relay between dmxnode-api and front ends.

pub mod command;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod fields;
pub mod format;
pub mod notify;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{
    CommandChannel, CommandOutcome, Confirm, LiveChannel, OutboundCommand, SystemCommandKind,
};
pub use config::{ConsoleConfig, DEFAULT_DEVICE_URL};
pub use console::Console;
pub use dispatch::MessageDispatcher;
pub use error::CoreError;
pub use fields::{
    FIELD_SPECS, FieldBinding, FieldKind, FieldSpec, FieldSyncAdapter, FieldValue, FormTarget,
    camel_to_kebab,
};
pub use notify::{NotificationQueue, Toast, ToastKind};
pub use state::{ApDisplay, ApRunState, ConsoleState, PixelTestIndicator, StatusDisplay};

pub use dmxnode_api::{ConnectionState, ReconnectPolicy, TlsMode};
