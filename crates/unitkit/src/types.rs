//! Core types for service-manager operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A lifecycle action that can be requested for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    /// Start the service if it is not running
    Start,
    /// Stop the service if it is running
    Stop,
    /// Restart the service unconditionally
    Restart,
    /// Ask the service to reload its configuration
    Reload,
    /// Enable the service at boot
    Enable,
    /// Disable the service at boot
    Disable,
    /// Query the service state without changing it
    Status,
    /// Do nothing
    Nothing,
}

impl ServiceAction {
    /// Every action, in declaration order.
    pub const ALL: [ServiceAction; 8] = [
        Self::Start,
        Self::Stop,
        Self::Restart,
        Self::Reload,
        Self::Enable,
        Self::Disable,
        Self::Status,
        Self::Nothing,
    ];

    /// Lowercase name as written in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Reload => "reload",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Status => "status",
            Self::Nothing => "nothing",
        }
    }

    /// Whether the action changes the state of the host.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Status | Self::Nothing)
    }

    /// Whether the action only touches the boot-time unit file state.
    pub fn is_boot_setting(&self) -> bool {
        matches!(self, Self::Enable | Self::Disable)
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown service action '{s}'"))
    }
}

/// Platform service-manager mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// systemd, driven through `systemctl`
    #[default]
    Systemd,
    /// LSB init scripts under `/etc/init.d`
    #[serde(alias = "sysvinit", alias = "init")]
    Sysv,
}

impl Provider {
    /// Lowercase name as written in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Systemd => "systemd",
            Self::Sysv => "sysv",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the service manager knows about the unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadState {
    Loaded,
    NotFound,
    Masked,
    Error,
    Unknown,
}

impl LoadState {
    /// Parse the `LoadState=` value printed by `systemctl show`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "loaded" | "stub" | "merged" => Self::Loaded,
            "not-found" => Self::NotFound,
            "masked" => Self::Masked,
            "error" | "bad-setting" => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// Run-state of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActiveState {
    Active,
    Reloading,
    Inactive,
    Failed,
    Activating,
    Deactivating,
    Unknown,
}

impl ActiveState {
    /// Parse the `ActiveState=` value printed by `systemctl show`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "active" => Self::Active,
            "reloading" => Self::Reloading,
            "inactive" => Self::Inactive,
            "failed" => Self::Failed,
            "activating" => Self::Activating,
            "deactivating" => Self::Deactivating,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Reloading => "reloading",
            Self::Inactive => "inactive",
            Self::Failed => "failed",
            Self::Activating => "activating",
            Self::Deactivating => "deactivating",
            Self::Unknown => "unknown",
        }
    }
}

/// Boot-time enablement of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitFileState {
    Enabled,
    Disabled,
    Static,
    Masked,
    Unknown,
}

impl UnitFileState {
    /// Parse the `UnitFileState=` value printed by `systemctl show`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "enabled" | "enabled-runtime" | "alias" => Self::Enabled,
            "disabled" => Self::Disabled,
            "static" | "indirect" | "generated" | "transient" => Self::Static,
            "masked" | "masked-runtime" => Self::Masked,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Static => "static",
            Self::Masked => "masked",
            Self::Unknown => "unknown",
        }
    }
}

/// Snapshot of a unit as reported by the service manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Unit name that was queried
    pub unit: String,
    pub load: LoadState,
    pub active: ActiveState,
    /// Provider-specific sub-state (e.g. "running", "exited", "dead")
    pub sub: String,
    pub unit_file: UnitFileState,
}

impl UnitStatus {
    /// Status of a unit the manager does not know about.
    pub fn not_found(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            load: LoadState::NotFound,
            active: ActiveState::Inactive,
            sub: "dead".to_string(),
            unit_file: UnitFileState::Unknown,
        }
    }

    /// Whether the unit exists on this host.
    pub fn is_present(&self) -> bool {
        !matches!(self.load, LoadState::NotFound)
    }

    /// Whether the unit is running (reloading counts as running).
    pub fn is_running(&self) -> bool {
        matches!(self.active, ActiveState::Active | ActiveState::Reloading)
    }

    /// Whether the unit starts at boot.
    pub fn is_enabled(&self) -> bool {
        matches!(self.unit_file, UnitFileState::Enabled)
    }

    /// One-line summary such as `active (running), enabled`.
    pub fn summary(&self) -> String {
        if !self.is_present() {
            return "not found".to_string();
        }
        format!(
            "{} ({}), {}",
            self.active.as_str(),
            self.sub,
            self.unit_file.as_str()
        )
    }
}

/// Configuration for retry behavior on transient manager errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 = no retry)
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_str() {
        assert_eq!("restart".parse::<ServiceAction>(), Ok(ServiceAction::Restart));
        assert_eq!(" Status ".parse::<ServiceAction>(), Ok(ServiceAction::Status));
        assert!("bounce".parse::<ServiceAction>().is_err());
    }

    #[test]
    fn test_action_classification() {
        assert!(ServiceAction::Restart.is_mutating());
        assert!(!ServiceAction::Status.is_mutating());
        assert!(!ServiceAction::Nothing.is_mutating());
        assert!(ServiceAction::Enable.is_boot_setting());
    }

    #[test]
    fn test_state_parsing() {
        assert_eq!(LoadState::parse("not-found"), LoadState::NotFound);
        assert_eq!(LoadState::parse("loaded\n"), LoadState::Loaded);
        assert_eq!(ActiveState::parse("failed"), ActiveState::Failed);
        assert_eq!(ActiveState::parse("bogus"), ActiveState::Unknown);
        assert_eq!(UnitFileState::parse("enabled-runtime"), UnitFileState::Enabled);
        assert_eq!(UnitFileState::parse(""), UnitFileState::Unknown);
    }

    #[test]
    fn test_unit_status_predicates() {
        let missing = UnitStatus::not_found("burrow");
        assert!(!missing.is_present());
        assert!(!missing.is_running());
        assert_eq!(missing.summary(), "not found");

        let running = UnitStatus {
            unit: "kafka-manager".to_string(),
            load: LoadState::Loaded,
            active: ActiveState::Active,
            sub: "running".to_string(),
            unit_file: UnitFileState::Enabled,
        };
        assert!(running.is_present());
        assert!(running.is_running());
        assert!(running.is_enabled());
        assert_eq!(running.summary(), "active (running), enabled");
    }

    #[test]
    fn test_retry_delay_calculation() {
        let config = RetryConfig {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        // Capped at max_delay
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(10));
    }

    #[test]
    fn test_default_retry_is_single_attempt() {
        assert_eq!(RetryConfig::default().max_attempts, 1);
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }
}
