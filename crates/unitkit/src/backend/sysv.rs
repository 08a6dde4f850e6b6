//! SysV backend driving LSB init scripts directly.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::runner::CommandRunner;
use crate::types::{ActiveState, LoadState, Provider, ServiceAction, UnitFileState, UnitStatus};
use std::path::{Path, PathBuf};

/// Backend that runs `/etc/init.d/<name> <action>`.
#[derive(Debug, Clone)]
pub struct SysvBackend {
    init_dir: PathBuf,
}

impl SysvBackend {
    pub fn new() -> Self {
        Self::with_init_dir("/etc/init.d")
    }

    /// Use a different script directory (useful for testing).
    pub fn with_init_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            init_dir: dir.as_ref().to_path_buf(),
        }
    }

    fn script(&self, unit: &str) -> PathBuf {
        self.init_dir.join(unit.trim_end_matches(".service"))
    }
}

impl Default for SysvBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SysvBackend {
    fn provider(&self) -> Provider {
        Provider::Sysv
    }

    fn is_available(&self) -> bool {
        self.init_dir.is_dir()
    }

    fn status(&self, runner: &dyn CommandRunner, unit: &str) -> Result<UnitStatus> {
        let script = self.script(unit);
        if !script.exists() {
            return Ok(UnitStatus::not_found(unit));
        }

        let output = runner.run(&script.to_string_lossy(), &["status"])?;
        let (active, sub) = match output.code {
            Some(0) => (ActiveState::Active, "running"),
            Some(1..=3) => (ActiveState::Inactive, "dead"),
            _ => (ActiveState::Unknown, "unknown"),
        };

        Ok(UnitStatus {
            unit: unit.to_string(),
            load: LoadState::Loaded,
            active,
            sub: sub.to_string(),
            unit_file: UnitFileState::Unknown,
        })
    }

    fn control(
        &self,
        runner: &dyn CommandRunner,
        unit: &str,
        action: ServiceAction,
    ) -> Result<()> {
        if !action.is_mutating() {
            return Ok(());
        }

        if action.is_boot_setting() {
            return Err(Error::Unsupported {
                provider: Provider::Sysv,
                action,
            });
        }

        let script = self.script(unit);
        if !script.exists() {
            return Err(Error::NotFound {
                unit: unit.to_string(),
            });
        }

        let output = runner.run(&script.to_string_lossy(), &[action.as_str()])?;
        if !output.success() {
            return Err(Error::from_manager_output(&output.stderr_str(), unit));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use std::fs;

    fn backend_with_script(name: &str) -> (tempfile::TempDir, SysvBackend) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(name), "#!/bin/sh\n").unwrap();
        let backend = SysvBackend::with_init_dir(dir.path());
        (dir, backend)
    }

    #[test]
    fn test_status_exit_codes() {
        let (_dir, backend) = backend_with_script("kafka-manager");

        let runner = ScriptedRunner::new().respond(0, "", "");
        assert!(backend.status(&runner, "kafka-manager").unwrap().is_running());

        let runner = ScriptedRunner::new().respond(3, "", "");
        let status = backend.status(&runner, "kafka-manager").unwrap();
        assert!(status.is_present());
        assert!(!status.is_running());

        let runner = ScriptedRunner::new().respond(4, "", "");
        let status = backend.status(&runner, "kafka-manager").unwrap();
        assert_eq!(status.active, ActiveState::Unknown);
    }

    #[test]
    fn test_missing_script_is_absent() {
        let (_dir, backend) = backend_with_script("kafka-manager");
        let runner = ScriptedRunner::new();

        assert!(!backend.status(&runner, "burrow").unwrap().is_present());
        let err = backend
            .control(&runner, "burrow", ServiceAction::Restart)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_restart_runs_script() {
        let (dir, backend) = backend_with_script("kafka-manager");
        let runner = ScriptedRunner::new().respond(0, "", "");

        backend
            .control(&runner, "kafka-manager.service", ServiceAction::Restart)
            .unwrap();

        let expected = format!("{} restart", dir.path().join("kafka-manager").display());
        assert_eq!(runner.calls(), vec![expected]);
    }

    #[test]
    fn test_enable_unsupported() {
        let (_dir, backend) = backend_with_script("kafka-manager");
        let err = backend
            .control(&ScriptedRunner::new(), "kafka-manager", ServiceAction::Enable)
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }
}
