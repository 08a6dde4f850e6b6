//! systemd backend using `systemctl` commands.

use crate::backend::Backend;
use crate::error::{Error, ErrorCategory, Result};
use crate::runner::CommandRunner;
use crate::types::{ActiveState, LoadState, Provider, ServiceAction, UnitFileState, UnitStatus};
use std::path::{Path, PathBuf};

/// Properties requested from `systemctl show`.
const SHOW_PROPERTIES: &str = "--property=LoadState,ActiveState,SubState,UnitFileState";

/// Backend that executes real `systemctl` commands.
#[derive(Debug, Clone)]
pub struct SystemdBackend {
    /// Path to the systemctl executable
    systemctl: String,
    /// Directory that exists only when systemd is PID 1
    runtime_dir: PathBuf,
}

impl SystemdBackend {
    /// Create a backend for the host's systemd.
    pub fn new() -> Self {
        Self {
            systemctl: find_systemctl(),
            runtime_dir: PathBuf::from("/run/systemd/system"),
        }
    }

    /// Create a backend with explicit paths (useful for testing).
    pub fn with_paths(systemctl: impl Into<String>, runtime_dir: impl AsRef<Path>) -> Self {
        Self {
            systemctl: systemctl.into(),
            runtime_dir: runtime_dir.as_ref().to_path_buf(),
        }
    }
}

impl Default for SystemdBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SystemdBackend {
    fn provider(&self) -> Provider {
        Provider::Systemd
    }

    fn is_available(&self) -> bool {
        self.runtime_dir.is_dir()
    }

    fn status(&self, runner: &dyn CommandRunner, unit: &str) -> Result<UnitStatus> {
        let output = runner.run(&self.systemctl, &["show", unit, "--no-pager", SHOW_PROPERTIES])?;

        if !output.success() {
            let err = Error::from_manager_output(&output.stderr_str(), unit);
            if err.category() == ErrorCategory::NotFound {
                return Ok(UnitStatus::not_found(unit));
            }
            return Err(err);
        }

        Ok(parse_show_output(unit, &output.stdout_str()))
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

        let output = runner.run(&self.systemctl, &[action.as_str(), unit])?;

        if !output.success() {
            return Err(Error::from_manager_output(&output.stderr_str(), unit));
        }

        Ok(())
    }
}

/// Find the systemctl executable path.
fn find_systemctl() -> String {
    let paths = ["/usr/bin/systemctl", "/bin/systemctl", "/usr/sbin/systemctl"];

    paths
        .iter()
        .find(|p| Path::new(p).exists())
        .map(|p| (*p).to_string())
        .unwrap_or_else(|| "systemctl".to_string())
}

/// Parse `KEY=value` lines printed by `systemctl show`.
pub(crate) fn parse_show_output(unit: &str, stdout: &str) -> UnitStatus {
    let mut status = UnitStatus {
        unit: unit.to_string(),
        load: LoadState::Unknown,
        active: ActiveState::Unknown,
        sub: String::new(),
        unit_file: UnitFileState::Unknown,
    };

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "LoadState" => status.load = LoadState::parse(value),
            "ActiveState" => status.active = ActiveState::parse(value),
            "SubState" => status.sub = value.trim().to_string(),
            "UnitFileState" => status.unit_file = UnitFileState::parse(value),
            _ => {}
        }
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    const RUNNING: &str =
        "LoadState=loaded\nActiveState=active\nSubState=running\nUnitFileState=enabled\n";
    const MISSING: &str =
        "LoadState=not-found\nActiveState=inactive\nSubState=dead\nUnitFileState=\n";

    fn backend() -> SystemdBackend {
        SystemdBackend::with_paths("systemctl", "/nonexistent/run/systemd/system")
    }

    #[test]
    fn test_parse_show_running() {
        let status = parse_show_output("kafka-manager", RUNNING);
        assert_eq!(status.load, LoadState::Loaded);
        assert_eq!(status.active, ActiveState::Active);
        assert_eq!(status.sub, "running");
        assert_eq!(status.unit_file, UnitFileState::Enabled);
        assert!(status.is_running());
    }

    #[test]
    fn test_parse_show_not_found() {
        let status = parse_show_output("burrow", MISSING);
        assert!(!status.is_present());
        assert_eq!(status.unit_file, UnitFileState::Unknown);
    }

    #[test]
    fn test_status_runs_show() {
        let runner = ScriptedRunner::new().respond(0, RUNNING, "");
        let status = backend().status(&runner, "kafka-manager").unwrap();

        assert!(status.is_running());
        assert_eq!(
            runner.calls(),
            vec![format!("systemctl show kafka-manager --no-pager {SHOW_PROPERTIES}")]
        );
    }

    #[test]
    fn test_status_failure_not_found_maps_to_absent() {
        let runner =
            ScriptedRunner::new().respond(1, "", "Unit burrow.service could not be found.");
        let status = backend().status(&runner, "burrow").unwrap();
        assert!(!status.is_present());
    }

    #[test]
    fn test_status_bus_failure_is_error() {
        let runner = ScriptedRunner::new().respond(1, "", "Failed to connect to bus: Host is down");
        let err = backend().status(&runner, "kafka-manager").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ManagerUnavailable);
    }

    #[test]
    fn test_control_restart() {
        let runner = ScriptedRunner::new().respond(0, "", "");
        backend()
            .control(&runner, "kafka-manager", ServiceAction::Restart)
            .unwrap();
        assert_eq!(runner.calls(), vec!["systemctl restart kafka-manager"]);
    }

    #[test]
    fn test_control_status_is_noop() {
        let runner = ScriptedRunner::new();
        backend()
            .control(&runner, "kafka-manager", ServiceAction::Status)
            .unwrap();
        backend()
            .control(&runner, "kafka-manager", ServiceAction::Nothing)
            .unwrap();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_control_missing_unit() {
        let runner = ScriptedRunner::new().respond(
            5,
            "",
            "Failed to restart kafka-manager.service: Unit kafka-manager.service not found.",
        );
        let err = backend()
            .control(&runner, "kafka-manager", ServiceAction::Restart)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_availability_follows_runtime_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SystemdBackend::with_paths("systemctl", dir.path()).is_available());
        assert!(!backend().is_available());
    }
}
