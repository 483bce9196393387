//! Output formatting: text and JSON.
//!
//! Text output is grouped by form with optional color; JSON mirrors the
//! same structure for scripting.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::{Map, Value, json};
use strum::IntoEnumIterator;

use dmxnode_core::{ConnectionState, ConsoleState, FormTarget, Toast, ToastKind};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            color: should_color(mode),
        }
    }

    fn paint(&self, text: &str, style: fn(&str) -> String) -> String {
        if self.color { style(text) } else { text.to_owned() }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint(text, |t| t.bold().cyan().to_string())
    }

    pub fn good(&self, text: &str) -> String {
        self.paint(text, |t| t.green().to_string())
    }

    pub fn bad(&self, text: &str) -> String {
        self.paint(text, |t| t.red().to_string())
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint(text, |t| t.dimmed().to_string())
    }

    pub fn connection(&self, state: ConnectionState) -> String {
        match state {
            ConnectionState::Connected => self.good("connected"),
            ConnectionState::Connecting => self.dim("connecting"),
            ConnectionState::Disconnected => self.bad("disconnected"),
        }
    }

    pub fn toast(&self, toast: &Toast) -> String {
        match toast.kind {
            ToastKind::Success => self.good(&format!("✓ {}", toast.message)),
            ToastKind::Error => self.bad(&format!("✗ {}", toast.message)),
            ToastKind::Info => format!("• {}", toast.message),
        }
    }
}

// ── Renderers ────────────────────────────────────────────────────────

/// Render the bound fields, optionally limited to one form.
pub fn render_fields(
    format: OutputFormat,
    painter: Painter,
    state: &ConsoleState,
    only: Option<FormTarget>,
) -> Result<String, CliError> {
    let forms: Vec<FormTarget> = match only {
        Some(form) => vec![form],
        None => FormTarget::iter().collect(),
    };

    match format {
        OutputFormat::Json => {
            let mut out = Map::new();
            for form in forms {
                out.insert(form.to_string(), Value::Object(state.fields.collect_form(form)));
            }
            if only.is_none() {
                out.insert("status".into(), status_json(state));
            }
            Ok(serde_json::to_string_pretty(&Value::Object(out))?)
        }
        OutputFormat::Text => {
            let mut lines = Vec::new();
            for form in forms {
                lines.push(painter.heading(&format!("[{form}] {}", form.label())));
                for binding in state.fields.form_fields(form) {
                    lines.push(format!("  {:<18} {}", binding.key, binding.value));
                }
            }
            if only.is_none() {
                lines.push(painter.heading("[status]"));
                lines.extend(status_lines(painter, state));
            }
            Ok(lines.join("\n"))
        }
    }
}

/// Status, AP and pixel-test readouts as text lines.
pub fn status_lines(painter: Painter, state: &ConsoleState) -> Vec<String> {
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_owned();
    let ap_state = state.ap.run_state.map_or_else(|| "-".into(), |s| s.to_string());

    vec![
        format!("  {:<18} {}", "connection", painter.connection(state.connection)),
        format!("  {:<18} {}", "uptime", or_dash(state.status.uptime.as_deref())),
        format!("  {:<18} {}", "signal", or_dash(state.status.signal.as_deref())),
        format!("  {:<18} {}", "free memory", or_dash(state.status.memory.as_deref())),
        format!("  {:<18} {}", "static ip inputs", visibility(state.static_ip_visible)),
        format!("  {:<18} {} ({})", "ap", ap_state, visibility(state.ap.panel_visible)),
        format!("  {:<18} {}", "ap ip", or_dash(state.ap.ip.as_deref())),
        format!(
            "  {:<18} {}",
            "ap stations",
            state.ap.stations.map_or_else(|| "-".into(), |n| n.to_string())
        ),
        format!("  {:<18} {}", "pixel test", state.pixel_test),
    ]
}

fn visibility(visible: bool) -> &'static str {
    if visible { "shown" } else { "hidden" }
}

pub fn status_json(state: &ConsoleState) -> Value {
    json!({
        "connection": format!("{:?}", state.connection).to_lowercase(),
        "uptime": state.status.uptime,
        "signal": state.status.signal,
        "memory": state.status.memory,
        "staticIpVisible": state.static_ip_visible,
        "ap": {
            "panelVisible": state.ap.panel_visible,
            "state": state.ap.run_state.map(|s| s.to_string()),
            "ip": state.ap.ip,
            "stations": state.ap.stations,
        },
        "pixelTest": state.pixel_test.to_string(),
    })
}

/// Print to stdout unless `--quiet`.
pub fn print_output(out: &str, quiet: bool) {
    if quiet || out.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{out}");
}
