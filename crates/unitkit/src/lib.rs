//! # unitkit
//!
//! Pure Rust client for OS service managers.
//!
//! This crate provides functionality for:
//! - Querying the run-state of a service unit (loaded, active, enabled)
//! - Starting, stopping, restarting, reloading, enabling and disabling units
//! - Classifying manager failures (not found, permission, unavailable)
//! - Retrying transient failures with exponential backoff
//!
//! Two providers are supported: systemd (through `systemctl`) and SysV
//! init scripts. All process execution goes through a [`CommandRunner`], so
//! callers decide whether commands run directly or through sudo.
//!
//! ## Example
//!
//! ```no_run
//! use unitkit::{Client, LocalRunner, Provider, ServiceAction};
//!
//! let client = Client::new(Provider::Systemd);
//! client.ensure_provider().expect("systemd not running");
//!
//! let status = client.status(&LocalRunner, "kafka-manager").expect("status failed");
//! println!("kafka-manager: {}", status.summary());
//!
//! client
//!     .control(&LocalRunner, "kafka-manager", ServiceAction::Restart)
//!     .expect("restart failed");
//! ```

pub mod backend;
pub mod error;
pub mod retry;
pub mod runner;
pub mod types;
pub mod unit_name;

pub use error::{Error, ErrorCategory, Result};
pub use runner::{CommandOutput, CommandRunner, LocalRunner};
pub use types::{
    ActiveState, LoadState, Provider, RetryConfig, ServiceAction, UnitFileState, UnitStatus,
};
pub use unit_name::validate_unit_name;

use backend::Backend;

/// High-level client for service-manager operations.
///
/// The client wraps a backend and validates unit names before any command
/// is built.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client for the given provider.
    pub fn new(provider: Provider) -> Self {
        Self {
            backend: backend::for_provider(provider),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// The provider this client drives.
    pub fn provider(&self) -> Provider {
        self.backend.provider()
    }

    /// Check if the provider is the active init system on this host.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Fail with [`Error::ProviderMismatch`] if the provider is not active here.
    pub fn ensure_provider(&self) -> Result<()> {
        if self.backend.is_available() {
            return Ok(());
        }
        Err(Error::ProviderMismatch {
            declared: self.provider(),
            reason: format!("{} is not the init system on this host", self.provider()),
        })
    }

    /// Query the current state of a unit.
    pub fn status(&self, runner: &dyn CommandRunner, unit: &str) -> Result<UnitStatus> {
        validate_unit_name(unit)?;
        self.backend.status(runner, unit)
    }

    /// Perform an action on a unit.
    pub fn control(
        &self,
        runner: &dyn CommandRunner,
        unit: &str,
        action: ServiceAction,
    ) -> Result<()> {
        validate_unit_name(unit)?;
        log::debug!("{} {} via {}", action, unit, self.provider());
        self.backend.control(runner, unit, action)
    }

    /// Perform an action on a unit, retrying transient failures.
    pub fn control_with_retry(
        &self,
        runner: &dyn CommandRunner,
        unit: &str,
        action: ServiceAction,
        config: &RetryConfig,
    ) -> Result<()> {
        retry::with_retry(config, Some(&retry::LogCallback), || {
            self.control(runner, unit, action)
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::Result;
    use crate::runner::{CommandOutput, CommandRunner};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Runner that records command lines and replays queued outputs.
    ///
    /// When the queue is empty every command succeeds with no output.
    #[derive(Default)]
    pub struct ScriptedRunner {
        responses: Mutex<VecDeque<CommandOutput>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, code: i32, stdout: &str, stderr: &str) -> Self {
            self.responses.lock().unwrap().push_back(CommandOutput {
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
                code: Some(code),
            });
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
            let mut line = program.to_string();
            for arg in args {
                line.push(' ');
                line.push_str(arg);
            }
            self.calls.lock().unwrap().push(line);

            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(CommandOutput {
                    code: Some(0),
                    ..Default::default()
                }))
        }
    }
}
