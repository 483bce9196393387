//! `dmxnode watch`: stream live state until Ctrl-C.
//!
//! Prints one line per visible change. Pressing Enter re-arms the
//! reconnect budget after the device went away for good.

use tokio::io::{AsyncBufReadExt, BufReader};

use dmxnode_core::{Console, ConsoleState};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Painter};

pub async fn handle(console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    let painter = Painter::new(global.color);
    let mut states = console.state_changes();
    let mut toasts = console.toasts();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    if !global.quiet {
        eprintln!(
            "{}",
            painter.dim(&format!(
                "watching {} (Enter reconnects, Ctrl-C quits)",
                console.config().device
            ))
        );
    }

    let mut last_line = String::new();
    let mut config_shown = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();

                if state.config_received && !config_shown {
                    config_shown = true;
                    let rendered = output::render_fields(global.output, painter, &state, None)?;
                    output::print_output(&rendered, global.quiet);
                }

                let line = status_line(global.output, painter, &state)?;
                if line != last_line {
                    output::print_output(&line, global.quiet);
                    last_line = line;
                }
            }

            changed = toasts.changed() => {
                if changed.is_err() {
                    break;
                }
                let toast = toasts.borrow_and_update().clone();
                if let Some(toast) = toast {
                    eprintln!("{}", painter.toast(&toast));
                }
            }

            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(_)) => {
                    tracing::info!("reconnect requested");
                    console.restart();
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    Ok(())
}

fn status_line(
    format: OutputFormat,
    painter: Painter,
    state: &ConsoleState,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(&output::status_json(state))?,
        OutputFormat::Text => {
            let dash = |v: Option<&String>| v.map_or("-", String::as_str).to_owned();
            let ap = state.ap.run_state.map_or_else(|| "-".into(), |s| s.to_string());
            format!(
                "{}  up {}  rssi {}  heap {}  ap {}  pixel {}",
                painter.connection(state.connection),
                dash(state.status.uptime.as_ref()),
                dash(state.status.signal.as_ref()),
                dash(state.status.memory.as_ref()),
                ap,
                state.pixel_test,
            )
        }
    })
}
