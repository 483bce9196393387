//! `dmxnode reboot` / `dmxnode factory-reset`.

use dmxnode_core::{CommandOutcome, Console, SystemCommandKind};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

pub async fn handle(
    console: &Console,
    kind: SystemCommandKind,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let yes = global.yes;
    let outcome = console
        .system_command(kind, &|prompt: &str| util::confirm(prompt, yes))
        .await?;

    let painter = Painter::new(global.color);
    match outcome {
        CommandOutcome::Declined => eprintln!("{}", painter.dim("cancelled")),
        CommandOutcome::Sent => {
            if let Some(toast) = console.notifications().current() {
                output::print_output(&painter.toast(&toast), global.quiet);
            }
        }
    }
    Ok(())
}
