// ── Observable console state ──
//
// Everything a front end renders: connection indicator, status readouts,
// AP panel, pixel-test indicator and the bound configuration fields.
// Mutated only by the dispatcher and local edits; consumers read snapshots.

use std::fmt;

use dmxnode_api::ConnectionState;

use crate::fields::{AP_ENABLED_KEY, DHCP_KEY, FieldSyncAdapter};

// ── Status readouts ──────────────────────────────────────────────────

/// Formatted device health readouts. `None` until first reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDisplay {
    pub uptime: Option<String>,
    pub signal: Option<String>,
    pub memory: Option<String>,
}

// ── AP panel ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApRunState {
    Running,
    Stopped,
}

impl fmt::Display for ApRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("运行中"),
            Self::Stopped => f.write_str("已停止"),
        }
    }
}

/// Access-point panel. Statistics keep their last value while the AP is
/// stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApDisplay {
    pub panel_visible: bool,
    pub run_state: Option<ApRunState>,
    pub ip: Option<String>,
    pub stations: Option<u64>,
}

// ── Pixel test ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PixelTestIndicator {
    #[default]
    Idle,
    Running,
    Failed,
}

impl fmt::Display for PixelTestIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("-"),
            Self::Running => f.write_str("测试运行中..."),
            Self::Failed => f.write_str("测试失败"),
        }
    }
}

// ── ConsoleState ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleState {
    pub connection: ConnectionState,
    pub status: StatusDisplay,
    pub ap: ApDisplay,
    pub pixel_test: PixelTestIndicator,
    pub fields: FieldSyncAdapter,
    /// Static IP inputs are shown only while DHCP is off.
    pub static_ip_visible: bool,
    /// Set once the first config snapshot has been applied.
    pub config_received: bool,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            status: StatusDisplay::default(),
            ap: ApDisplay::default(),
            pixel_test: PixelTestIndicator::Idle,
            fields: FieldSyncAdapter::default(),
            // DHCP starts unchecked, so the static inputs start visible.
            static_ip_visible: true,
            config_received: false,
        }
    }
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute static-IP visibility from the DHCP toggle.
    pub fn derive_static_ip_visibility(&mut self) {
        let dhcp = self.fields.toggle(DHCP_KEY).unwrap_or(false);
        self.static_ip_visible = !dhcp;
    }

    /// Show or hide the AP panel from the AP toggle.
    pub fn derive_ap_panel_visibility(&mut self) {
        self.ap.panel_visible = self.fields.toggle(AP_ENABLED_KEY).unwrap_or(false);
    }
}
