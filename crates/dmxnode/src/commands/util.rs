//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use dmxnode_core::{Console, SystemCommandKind};

use crate::error::CliError;

/// How long to wait on the device: the request timeout from the profile
/// or `--timeout`.
pub fn wait_timeout(console: &Console) -> Duration {
    console.config().timeout
}

/// Refuse a destructive command up front when the prompt could never be
/// answered.
pub fn ensure_can_confirm(kind: SystemCommandKind, yes_flag: bool) -> Result<(), CliError> {
    if yes_flag || std::io::stdin().is_terminal() {
        return Ok(());
    }
    Err(CliError::NonInteractiveRequiresYes {
        action: kind.to_string(),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// A prompt that cannot be shown counts as a "no".
pub fn confirm(message: &str, yes_flag: bool) -> bool {
    if yes_flag {
        return true;
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "confirmation prompt failed");
            false
        })
}

/// Split a `KEY=VALUE` argument. The value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(&str, &str), CliError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(CliError::Validation {
            field: "set".into(),
            reason: format!("expected KEY=VALUE, got '{raw}'"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("deviceName=stage=left").unwrap(),
            ("deviceName", "stage=left")
        );
        assert_eq!(parse_assignment("dhcpEnabled=").unwrap(), ("dhcpEnabled", ""));
    }

    #[test]
    fn assignment_without_key_is_rejected() {
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("artnetUniverse").is_err());
    }

    #[test]
    fn yes_flag_skips_prompt() {
        assert!(confirm("确定要重启设备吗？", true));
        assert!(ensure_can_confirm(SystemCommandKind::Reboot, true).is_ok());
    }
}
