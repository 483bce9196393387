//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use dmxnode_config::ConfigError;
use dmxnode_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REQUEST: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to device at {url}")]
    #[diagnostic(
        code(dmxnode::connection_failed),
        help(
            "Check that the node is powered and reachable.\n\
             When joined to the node's own access point the console is at http://192.168.4.1"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Device channel closed")]
    #[diagnostic(code(dmxnode::disconnected))]
    Disconnected,

    #[error("Timed out after {seconds}s waiting for {waiting_for}")]
    #[diagnostic(
        code(dmxnode::timeout),
        help("Increase the wait with --timeout or check the device is reachable.")
    )]
    Timeout {
        seconds: u64,
        waiting_for: &'static str,
    },

    // ── Requests ─────────────────────────────────────────────────────

    #[error("Request to {endpoint} failed: {reason}")]
    #[diagnostic(code(dmxnode::request_failed))]
    RequestFailed { endpoint: String, reason: String },

    // ── Fields ───────────────────────────────────────────────────────

    #[error("Unknown field '{key}'")]
    #[diagnostic(
        code(dmxnode::unknown_field),
        help("Run: dmxnode show to list the available fields")
    )]
    UnknownField { key: String },

    #[error("Field '{key}' does not belong to the {form} form")]
    #[diagnostic(
        code(dmxnode::wrong_form),
        help("Run: dmxnode show --form {form} to list its fields")
    )]
    WrongForm { key: String, form: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dmxnode::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dmxnode::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: dmxnode config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device configured")]
    #[diagnostic(
        code(dmxnode::no_device),
        help(
            "Pass --device http://<node-ip>, set DMXNODE_DEVICE, or create a profile\n\
             with: dmxnode config init\n\
             Expected at: {path}"
        )
    )]
    NoDevice { path: String },

    #[error(transparent)]
    #[diagnostic(code(dmxnode::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(dmxnode::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(dmxnode::json))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(dmxnode::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::RequestFailed { .. } => exit_code::REQUEST,
            Self::UnknownField { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::WrongForm { .. }
            | Self::NoDevice { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::Config(ConfigError::Validation { .. }) => exit_code::USAGE,
            Self::Config(ConfigError::UnknownProfile { .. }) => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Disconnected => CliError::Disconnected,

            CoreError::Timeout {
                timeout_secs,
                waiting_for,
            } => CliError::Timeout {
                seconds: timeout_secs,
                waiting_for,
            },

            CoreError::RequestFailed {
                endpoint, reason, ..
            } => CliError::RequestFailed { endpoint, reason },

            CoreError::UnknownField { key } => CliError::UnknownField { key },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "device".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
