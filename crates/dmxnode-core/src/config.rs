// ── Runtime console configuration ──
//
// Describes which device to talk to and how. Never touches disk; the CLI
// builds a `ConsoleConfig` from its profile and hands it in.

use std::time::Duration;

use url::Url;

use dmxnode_api::{ReconnectPolicy, TlsMode, TransportConfig};

use crate::notify::DEFAULT_TOAST_TTL;

/// Address the firmware serves on when running as its own access point.
pub const DEFAULT_DEVICE_URL: &str = "http://192.168.4.1";

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Device origin (e.g., `http://192.168.4.1`).
    pub device: Url,
    pub reconnect: ReconnectPolicy,
    pub toast_ttl: Duration,
    pub tls: TlsMode,
    /// Request timeout for one-shot requests.
    pub timeout: Duration,
}

impl ConsoleConfig {
    pub fn new(device: Url) -> Self {
        Self {
            device,
            reconnect: ReconnectPolicy::default(),
            toast_ttl: DEFAULT_TOAST_TTL,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls,
            timeout: self.timeout,
        }
    }
}
