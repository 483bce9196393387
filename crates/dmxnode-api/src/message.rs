//! Wire messages exchanged over the device channel.
//!
//! Inbound frames are JSON objects discriminated by a `type` field. Decoding
//! is a closed set of known kinds plus an [`InboundMessage::Unknown`]
//! fallback, so firmware that grows new message kinds never breaks the
//! console.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

// ── Inbound payloads ─────────────────────────────────────────────────

/// Periodic device health report. Every field is optional; consumers merge
/// only what is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusPayload {
    /// Seconds since boot.
    pub uptime: Option<u64>,

    /// WiFi signal strength in dBm (typically negative).
    pub rssi: Option<i64>,

    /// Free heap in bytes.
    #[serde(rename = "freeHeap")]
    pub free_heap: Option<u64>,

    /// Access-point state piggybacked on the status report.
    pub ap_enabled: Option<bool>,
}

/// Full configuration snapshot: camelCase keys to scalar values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPayload(pub Map<String, Value>);

impl ConfigPayload {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Access-point state and statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApStatusPayload {
    #[serde(default)]
    pub ap_enabled: bool,
    pub ap_ip: Option<String>,
    pub ap_stations: Option<u64>,
}

/// Confirmation that a pixel test mode was accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PixelTestPayload {
    #[serde(default)]
    pub success: bool,
}

// ── InboundMessage ───────────────────────────────────────────────────

/// A decoded frame from the device channel.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Status(StatusPayload),
    Config(ConfigPayload),
    ApStatus(ApStatusPayload),
    PixelTest(PixelTestPayload),
    /// A kind this client does not understand. Never changes state.
    Unknown { kind: String },
}

impl InboundMessage {
    /// Decode one text frame.
    ///
    /// Fails on invalid JSON, a non-object frame, a missing or non-string
    /// `type`, or a payload whose fields have the wrong types. Unrecognized
    /// kinds are not a failure.
    pub fn decode(text: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(text).map_err(decode_error)?;
        let Value::Object(mut fields) = value else {
            return Err(Error::Decode {
                message: "frame is not a JSON object".into(),
            });
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(other) => {
                return Err(Error::Decode {
                    message: format!("`type` must be a string, got {other}"),
                });
            }
            None => {
                return Err(Error::Decode {
                    message: "missing `type` discriminator".into(),
                });
            }
        };

        match kind.as_str() {
            "status" => payload(fields).map(Self::Status),
            "config" => Ok(Self::Config(ConfigPayload(fields))),
            "ap_status" => payload(fields).map(Self::ApStatus),
            "pixel_test" => payload(fields).map(Self::PixelTest),
            _ => Ok(Self::Unknown { kind }),
        }
    }

    /// The wire discriminator of this message.
    pub fn kind(&self) -> &str {
        match self {
            Self::Status(_) => "status",
            Self::Config(_) => "config",
            Self::ApStatus(_) => "ap_status",
            Self::PixelTest(_) => "pixel_test",
            Self::Unknown { kind } => kind,
        }
    }
}

fn payload<T: for<'de> Deserialize<'de>>(fields: Map<String, Value>) -> Result<T, Error> {
    serde_json::from_value(Value::Object(fields)).map_err(decode_error)
}

#[allow(clippy::needless_pass_by_value)]
fn decode_error(err: serde_json::Error) -> Error {
    Error::Decode {
        message: err.to_string(),
    }
}

// ── Outbound ─────────────────────────────────────────────────────────

/// Messages the console pushes over the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    /// Switch the pixel output into a test pattern (0 = off).
    PixelTest { mode: i64 },
}

// ── Tests ────────────────────────────────────────────────────────────
