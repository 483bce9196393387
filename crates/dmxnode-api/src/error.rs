use thiserror::Error;

/// Top-level error type for the `dmxnode-api` crate.
///
/// Covers the two wire surfaces of the device: the live WebSocket channel
/// and the one-shot HTTP requests. `dmxnode-core` maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The device origin uses a scheme we cannot derive a channel URL from.
    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    /// TLS setup error while building the HTTP client.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── One-shot requests ───────────────────────────────────────────
    /// The device answered a request with a non-2xx status.
    #[error("HTTP error! status: {status}")]
    Status { endpoint: String, status: u16 },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed or broke mid-stream.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// An inbound frame could not be decoded into a known message shape.
    #[error("Malformed frame: {message}")]
    Decode { message: String },

    /// An outbound payload could not be serialized.
    #[error("Serialization error: {0}")]
    Encode(#[from] serde_json::Error),
}
