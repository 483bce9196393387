//! Configuration for the DMX node console.
//!
//! TOML profiles merged with `DMXNODE_` environment variables, and
//! translation to `dmxnode_core::ConsoleConfig`. The CLI layers its own
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dmxnode_core::{ConsoleConfig, ReconnectPolicy, TlsMode};

/// Environment prefix. Nested keys use a double underscore
/// (`DMXNODE_DEFAULTS__TIMEOUT`).
pub const ENV_PREFIX: &str = "DMXNODE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{name}'")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: `explicit`, else `default_profile`,
    /// else `"default"`.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept self-signed certificates on `https` origins.
    #[serde(default = "default_insecure")]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: default_insecure(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_insecure() -> bool {
    true
}

/// A named device profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Device origin (e.g., "http://192.168.4.1").
    pub device: String,

    /// Reconnect attempts after a close before giving up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_reconnect_attempts: Option<u32>,

    /// Delay between reconnect attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,

    /// How long a notification stays visible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toast_ttl_ms: Option<u64>,

    /// Override insecure TLS setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Profile {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            max_reconnect_attempts: None,
            reconnect_delay_ms: None,
            toast_ttl_ms: None,
            insecure: None,
            timeout: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "dmxnode", "dmxnode").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("dmxnode");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse and check a device origin: `http` or `https` with a host.
pub fn parse_device_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "device".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "device".into(),
            reason: format!("expected an http or https URL, got '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation {
            field: "device".into(),
            reason: format!("'{raw}' has no host"),
        });
    }
    Ok(url)
}

/// Build a `ConsoleConfig` from a profile and the global defaults.
pub fn profile_to_console_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let device = parse_device_url(&profile.device)?;

    let fallback = ReconnectPolicy::default();
    let reconnect = ReconnectPolicy {
        max_attempts: profile.max_reconnect_attempts.unwrap_or(fallback.max_attempts),
        delay: profile
            .reconnect_delay_ms
            .map_or(fallback.delay, Duration::from_millis),
    };

    let mut config = ConsoleConfig::new(device);
    config.reconnect = reconnect;
    if let Some(ttl) = profile.toast_ttl_ms {
        config.toast_ttl = Duration::from_millis(ttl);
    }
    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else {
        TlsMode::System
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(config)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
default_profile = "stage"

[defaults]
timeout = 10

[profiles.stage]
device = "http://192.168.4.1"
max_reconnect_attempts = 8
reconnect_delay_ms = 500

[profiles.booth]
device = "https://node.local"
insecure = false
toast_ttl_ms = 5000
"#;

    #[test]
    fn loads_profiles_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(cfg.profile_name(None), "stage");
            assert_eq!(cfg.profile_name(Some("booth")), "booth");
            assert_eq!(cfg.defaults.timeout, 10);
            assert!(cfg.defaults.insecure);
            assert_eq!(cfg.profiles.len(), 2);
            assert_eq!(cfg.profile("stage").unwrap().max_reconnect_attempts, Some(8));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("absent.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(cfg, Config::default());
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("DMXNODE_DEFAULTS__TIMEOUT", "3");
            jail.set_env("DMXNODE_DEFAULT_PROFILE", "booth");

            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(cfg.defaults.timeout, 3);
            assert_eq!(cfg.profile_name(None), "booth");
            Ok(())
        });
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.profile("nope"),
            Err(ConfigError::UnknownProfile { name }) if name == "nope"
        ));
    }

    #[test]
    fn profile_translation_applies_overrides() {
        let defaults = Defaults {
            timeout: 10,
            insecure: true,
        };
        let mut profile = Profile::new("https://node.local");
        profile.max_reconnect_attempts = Some(2);
        profile.reconnect_delay_ms = Some(250);
        profile.toast_ttl_ms = Some(1500);
        profile.insecure = Some(false);

        let config = profile_to_console_config(&profile, &defaults).unwrap();
        assert_eq!(config.device.as_str(), "https://node.local/");
        assert_eq!(config.reconnect.max_attempts, 2);
        assert_eq!(config.reconnect.delay, Duration::from_millis(250));
        assert_eq!(config.toast_ttl, Duration::from_millis(1500));
        assert_eq!(config.tls, TlsMode::System);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn profile_translation_defaults() {
        let config =
            profile_to_console_config(&Profile::new("http://10.0.0.5"), &Defaults::default())
                .unwrap();
        assert_eq!(config.reconnect, ReconnectPolicy::default());
        assert_eq!(config.toast_ttl, Duration::from_millis(3000));
        assert_eq!(config.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn device_url_validation() {
        assert!(parse_device_url("http://192.168.4.1").is_ok());
        for bad in ["not a url", "ftp://node.local", "ws://node.local"] {
            assert!(
                matches!(parse_device_url(bad), Err(ConfigError::Validation { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles
            .insert("default".into(), Profile::new("http://192.168.4.1"));
        save_config_to(&path, &cfg).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[profiles.default]"));
        let parsed: Config = toml::from_str(&written).unwrap();
        assert_eq!(parsed, cfg);
    }
}
