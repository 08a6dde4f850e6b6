//! Backend abstraction for service managers.
//!
//! The [`Backend`] trait defines the interface for talking to an init
//! system, allowing for different implementations (systemd, SysV init
//! scripts, fakes for testing).

pub mod systemd;
pub mod sysv;

use crate::error::Result;
use crate::runner::CommandRunner;
use crate::types::{Provider, ServiceAction, UnitStatus};

/// Backend trait for service-manager operations.
pub trait Backend: Send + Sync {
    /// Which provider this backend drives.
    fn provider(&self) -> Provider;

    /// Whether this provider is the active init system on this host.
    fn is_available(&self) -> bool;

    /// Query the current state of a unit.
    ///
    /// A unit the manager does not know about is reported as a status with
    /// [`LoadState::NotFound`](crate::LoadState::NotFound), not as an error.
    fn status(&self, runner: &dyn CommandRunner, unit: &str) -> Result<UnitStatus>;

    /// Perform a mutating action on a unit.
    ///
    /// `Status` and `Nothing` are no-ops.
    fn control(&self, runner: &dyn CommandRunner, unit: &str, action: ServiceAction)
    -> Result<()>;
}

/// Get the backend for a provider.
pub fn for_provider(provider: Provider) -> Box<dyn Backend> {
    match provider {
        Provider::Systemd => Box::new(systemd::SystemdBackend::new()),
        Provider::Sysv => Box::new(sysv::SysvBackend::new()),
    }
}
