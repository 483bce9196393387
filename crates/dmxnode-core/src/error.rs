// ── Core error types ──
//
// User-facing errors from dmxnode-core. Consumers never see raw HTTP or
// WebSocket failures; the `From<dmxnode_api::Error>` impl translates
// transport-layer errors into console-level variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Device channel is not connected")]
    Disconnected,

    #[error("Timed out after {timeout_secs}s waiting for {waiting_for}")]
    Timeout {
        timeout_secs: u64,
        waiting_for: &'static str,
    },

    // ── Request errors ───────────────────────────────────────────────
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed {
        endpoint: String,
        reason: String,
        /// HTTP status code, if the device answered.
        status: Option<u16>,
    },

    // ── Field errors ─────────────────────────────────────────────────
    #[error("Unknown field: {key}")]
    UnknownField { key: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short reason suitable for a toast.
    pub fn reason(&self) -> String {
        match self {
            Self::RequestFailed { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dmxnode_api::Error> for CoreError {
    fn from(err: dmxnode_api::Error) -> Self {
        use dmxnode_api::Error as ApiError;

        match err {
            ApiError::Status { endpoint, status } => CoreError::RequestFailed {
                endpoint,
                reason: format!("HTTP error! status: {status}"),
                status: Some(status),
            },
            ApiError::Transport(ref e) => CoreError::RequestFailed {
                endpoint: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), |u| u.path().to_string()),
                reason: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::UnsupportedScheme(scheme) => CoreError::Config {
                message: format!("Unsupported URL scheme '{scheme}' (expected http or https)"),
            },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            ApiError::Decode { message } => {
                CoreError::Internal(format!("Malformed frame: {message}"))
            }
            ApiError::Encode(e) => CoreError::Internal(format!("Serialization error: {e}")),
        }
    }
}
