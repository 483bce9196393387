//! Command dispatch: bridges CLI args -> console operations -> output.

pub mod config_cmd;
pub mod pixel;
pub mod show;
pub mod submit;
pub mod system;
pub mod util;
pub mod watch;

use dmxnode_core::{Console, FormTarget, SystemCommandKind};

use crate::cli::{Command, FormArg, GlobalOpts};
use crate::config::build_console_config;
use crate::error::CliError;

impl From<FormArg> for FormTarget {
    fn from(form: FormArg) -> Self {
        match form {
            FormArg::Network => FormTarget::Network,
            FormArg::Artnet => FormTarget::Artnet,
            FormArg::Pixel => FormTarget::Pixel,
            FormArg::Ap => FormTarget::Ap,
        }
    }
}

/// Start a console for the resolved device, run one command against it,
/// and stop it again whatever the outcome.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let system_kind = match cmd {
        Command::Reboot => Some(SystemCommandKind::Reboot),
        Command::FactoryReset => Some(SystemCommandKind::FactoryReset),
        _ => None,
    };
    // Refuse before connecting when nobody can answer the prompt.
    if let Some(kind) = system_kind {
        util::ensure_can_confirm(kind, global.yes)?;
    }

    let config = build_console_config(global)?;
    let console = Console::start(config)?;

    let result = match cmd {
        Command::Watch => watch::handle(&console, global).await,
        Command::Show(args) => show::handle(&console, args, global).await,
        Command::Submit(args) => submit::handle(&console, args, global).await,
        Command::PixelTest(args) => pixel::handle(&console, &args, global).await,
        Command::Reboot | Command::FactoryReset => match system_kind {
            Some(kind) => system::handle(&console, kind, global).await,
            None => Err(CliError::Internal("system command without a kind".into())),
        },
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the device".into(),
        )),
    };

    console.shutdown().await;
    result
}
