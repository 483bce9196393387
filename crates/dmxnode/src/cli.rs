//! Clap derive structures for the `dmxnode` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dmxnode -- console for ESP32 Art-Net / DMX nodes
#[derive(Debug, Parser)]
#[command(
    name = "dmxnode",
    version,
    about = "Configure and monitor ESP32 DMX nodes from the command line",
    long_about = "Talks to a DMX node's built-in web console: live status over its\n\
        WebSocket channel, configuration forms and system commands over HTTP.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "DMXNODE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device URL (overrides profile), e.g. http://192.168.4.1
    #[arg(long, short = 'd', env = "DMXNODE_DEVICE", global = true)]
    pub device: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DMXNODE_OUTPUT",
        default_value = "text",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates on https devices
    #[arg(long, short = 'k', env = "DMXNODE_INSECURE", global = true)]
    pub insecure: bool,

    /// Timeout in seconds for requests and for waiting on the device
    #[arg(long, env = "DMXNODE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream live status, AP and pixel-test updates until Ctrl-C
    #[command(alias = "w")]
    Watch,

    /// Print the device configuration
    #[command(alias = "s")]
    Show(ShowArgs),

    /// Edit fields of one configuration form and save it
    Submit(SubmitArgs),

    /// Switch the pixel output into a test pattern (0 = off)
    PixelTest(PixelTestArgs),

    /// Reboot the device
    Reboot,

    /// Restore factory settings (erases all configuration)
    FactoryReset,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Forms ────────────────────────────────────────────────────────────

/// Configuration forms on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormArg {
    /// Device name, DHCP and static addressing
    Network,
    /// Art-Net net / subnet / universe and DMX start address
    Artnet,
    /// Pixel count, type and output enable
    Pixel,
    /// Built-in access point
    Ap,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Only show this form
    #[arg(long, short = 'f')]
    pub form: Option<FormArg>,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Form to submit
    pub form: FormArg,

    /// Field edits as key=value (e.g. --set artnetUniverse=3)
    #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
    pub set: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PixelTestArgs {
    /// Test pattern number (0 turns testing off)
    pub mode: i64,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile
    Init {
        /// Device URL (prompted for when omitted)
        #[arg(long = "device-url")]
        device_url: Option<String>,

        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
