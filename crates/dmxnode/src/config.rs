//! Translation from CLI flags + config profiles to `ConsoleConfig`.
//!
//! This is the single boundary where CLI config types cross into core types.

use std::time::Duration;

use dmxnode_config::{Config, Defaults, Profile};
use dmxnode_core::{ConsoleConfig, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use dmxnode_config::{config_path, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build a `ConsoleConfig` from the config file, profile, and CLI overrides.
///
/// Precedence: `--device` / `DMXNODE_DEVICE` > profile. A device given on
/// the command line needs no profile at all.
pub fn build_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match (cfg.profiles.get(&profile_name), global.device.as_deref()) {
        (Some(profile), Some(device)) => Profile {
            device: device.to_owned(),
            ..profile.clone()
        },
        (Some(profile), None) => profile.clone(),
        (None, Some(device)) => Profile::new(device),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoDevice {
                path: config_path().display().to_string(),
            });
        }
    };

    resolve_profile(&profile, &cfg.defaults, global)
}

/// Apply flag overrides on top of a profile.
pub fn resolve_profile(
    profile: &Profile,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ConsoleConfig, CliError> {
    let mut config = dmxnode_config::profile_to_console_config(profile, defaults)?;

    if global.insecure {
        config.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    tracing::debug!(device = %config.device, "resolved console config");
    Ok(config)
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
