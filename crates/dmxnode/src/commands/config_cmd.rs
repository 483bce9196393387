//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::Input;

use dmxnode_config::{Profile, parse_device_url, save_config};
use dmxnode_core::DEFAULT_DEVICE_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_device_url() -> Result<String, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "device-url".into(),
            reason: "no terminal to prompt on; pass --device-url".into(),
        });
    }
    Input::new()
        .with_prompt("Device URL")
        .default(DEFAULT_DEVICE_URL.to_owned())
        .interact_text()
        .map_err(prompt_err)
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init { device_url, name } => {
            let device = match device_url {
                Some(url) => url,
                None => prompt_device_url()?,
            };
            // Reject bad URLs before anything is written.
            parse_device_url(&device)?;

            let mut cfg = config::load_config_or_default();
            let profile = match cfg.profiles.remove(&name) {
                Some(existing) => Profile { device, ..existing },
                None => Profile::new(device),
            };
            cfg.profiles.insert(name.clone(), profile);
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }

            let path = save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Configuration written to {}", path.display());
                eprintln!("  Profile: {name}");
                eprintln!("\n  Test it: dmxnode show");
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match global.output {
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
                OutputFormat::Text => toml::to_string_pretty(&cfg).map_err(|e| {
                    CliError::Validation {
                        field: "config".into(),
                        reason: format!("failed to serialize config: {e}"),
                    }
                })?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let active = config::active_profile_name(global, &cfg);

            let out = match global.output {
                OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                    "active": active,
                    "profiles": cfg.profiles,
                }))?,
                OutputFormat::Text => cfg
                    .profiles
                    .iter()
                    .map(|(name, profile)| {
                        let marker = if *name == active { "*" } else { " " };
                        format!("{marker} {name:<16} {}", profile.device)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            };
            if cfg.profiles.is_empty() && !global.quiet {
                eprintln!("No profiles configured. Create one with: dmxnode config init");
            }
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}
