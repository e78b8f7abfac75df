// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Shell command runner: launches button commands through `sh -c` without waiting.
/// Boot actions run the same command with LAUNCHER_BOOT set to the action keyword.

use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::lngc_core::BootAction;
use crate::lngtk_toolkit::{CommandRunner, LaunchError};

pub const BOOT_ENV: &str = "LAUNCHER_BOOT";

#[derive(Debug, Default)]
pub struct ShellRunner {
    shell: Option<String>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different shell than `sh`
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self { shell: Some(shell.into()) }
    }

    fn command(&self, command: &str) -> Result<Command, LaunchError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(LaunchError::EmptyCommand);
        }
        let mut cmd = Command::new(self.shell.as_deref().unwrap_or("sh"));
        cmd.arg("-c").arg(command).stdin(Stdio::null());
        Ok(cmd)
    }

    fn spawn(mut cmd: Command, command: &str) -> Result<(), LaunchError> {
        let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
            command: command.to_string(),
            source,
        })?;
        debug!("RUNNER: started pid={} '{}'", child.id(), command);
        Ok(())
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> Result<(), LaunchError> {
        info!("RUNNER: run '{}'", command);
        let cmd = self.command(command)?;
        Self::spawn(cmd, command)
    }

    fn boot(&mut self, command: &str, action: BootAction) -> Result<(), LaunchError> {
        if action == BootAction::None {
            return Ok(());
        }
        info!("RUNNER: boot ({}) '{}'", action.keyword(), command);
        let mut cmd = self.command(command)?;
        cmd.env(BOOT_ENV, action.keyword().to_ascii_lowercase());
        Self::spawn(cmd, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_rejected() {
        let mut runner = ShellRunner::new();
        assert!(matches!(runner.run("   "), Err(LaunchError::EmptyCommand)));
        assert!(matches!(runner.boot("", BootAction::Boot), Err(LaunchError::EmptyCommand)));
    }

    #[test]
    fn test_boot_none_does_nothing() {
        let mut runner = ShellRunner::with_shell("/nonexistent/shell");
        assert!(runner.boot("true", BootAction::None).is_ok());
    }

    #[test]
    fn test_missing_shell_reports_spawn_error() {
        let mut runner = ShellRunner::with_shell("/nonexistent/shell");
        assert!(matches!(runner.run("true"), Err(LaunchError::Spawn { .. })));
    }
}
