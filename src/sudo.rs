//! Scoped sudo context for privileged service actions
//!
//! Sudo is never requested for the entire process. Instead:
//! 1. The manifest's `[sudo]` mode decides which declarations need it
//! 2. All state is queried first (no sudo needed)
//! 3. Sudo is acquired once for the privileged batch
//! 4. Sudo is released immediately after

use anyhow::{Context, Result, bail};
use reconcile::{CommandOutput, PrivilegeClassifier, PrivilegeProvider, Resource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::process::{Command, Output};

/// When to escalate mutating service actions through sudo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SudoMode {
    /// Use sudo unless already running as root
    #[default]
    Auto,
    /// Always use sudo for mutating actions
    Always,
    /// Never use sudo; permission errors come back from the service manager
    Never,
}

/// The `[sudo]` table of a manifest
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SudoConfig {
    #[serde(default)]
    pub mode: SudoMode,
}

impl SudoConfig {
    /// Whether privileged resources should go through sudo
    pub fn escalates(&self, running_as_root: bool) -> bool {
        match self.mode {
            SudoMode::Auto => !running_as_root,
            SudoMode::Always => true,
            SudoMode::Never => false,
        }
    }
}

impl PrivilegeClassifier for SudoConfig {
    fn requires_privilege(&self, resource: &dyn Resource) -> bool {
        resource.requires_privilege() && self.escalates(is_root())
    }
}

/// Whether the process runs with an effective uid of 0
#[cfg(unix)]
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and never fails
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Scoped sudo context - automatically invalidates on drop
pub struct SudoContext {
    validated: bool,
}

impl SudoContext {
    /// Acquire sudo privileges with a reason shown to user
    pub fn acquire(reason: &str) -> Result<Self> {
        eprintln!();
        eprintln!("  Sudo required: {reason}");
        eprintln!();

        // Validate sudo (will prompt for password)
        let status = Command::new("sudo")
            .arg("-v")
            .status()
            .context("Failed to execute sudo")?;

        if !status.success() {
            bail!("Failed to acquire sudo privileges");
        }

        log::debug!("sudo credentials validated");
        Ok(Self { validated: true })
    }

    fn run_internal(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        if !self.validated {
            bail!("Sudo context not validated");
        }

        log::debug!("exec: sudo {} {}", cmd, args.join(" "));
        Command::new("sudo")
            .arg(cmd)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute: sudo {cmd} {args:?}"))
    }
}

impl PrivilegeProvider for SudoContext {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput> {
        Ok(self.run_internal(cmd, args)?.into())
    }
}

impl Drop for SudoContext {
    fn drop(&mut self) {
        // Invalidate sudo timestamp to release privileges
        let _ = Command::new("sudo").arg("-k").status();
    }
}

/// Runs service-manager commands through a privilege provider
pub struct SudoRunner<'a> {
    provider: &'a dyn PrivilegeProvider,
}

impl<'a> SudoRunner<'a> {
    pub fn new(provider: &'a dyn PrivilegeProvider) -> Self {
        Self { provider }
    }
}

impl unitkit::CommandRunner for SudoRunner<'_> {
    fn run(&self, program: &str, args: &[&str]) -> unitkit::Result<unitkit::CommandOutput> {
        self.provider
            .run(program, args)
            .map_err(|e| unitkit::Error::CommandFailed {
                message: format!("sudo {program}: {e:#}"),
                stderr: String::new(),
            })
    }
}
