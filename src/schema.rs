//! Service manifest schema
//!
//! A manifest is a TOML (or JSON) file listing service declarations:
//!
//! ```toml
//! [sudo]
//! mode = "auto"
//!
//! [[service]]
//! name = "kafka-manager"
//! provider = "systemd"
//! supports = ["restart", "status", "stop", "start"]
//! action = "restart"
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use unitkit::{Provider, RetryConfig, ServiceAction};

use crate::sudo::SudoConfig;

// ============================================================================
// Manifest
// ============================================================================

/// The full contents of a service manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Privilege escalation policy
    #[serde(default)]
    pub sudo: SudoConfig,

    /// Retry policy for transient service-manager failures
    #[serde(default)]
    pub retry: RetrySettings,

    /// Service declarations, evaluated in order
    #[serde(default, rename = "service")]
    pub services: Vec<ServiceDeclaration>,
}

impl Manifest {
    /// Load a manifest, picking the format from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest: {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let manifest = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        manifest.with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format in manifest")
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid JSON format in manifest")
    }

    /// Check every invariant, returning all violations
    ///
    /// Disabled declarations are inert and are not checked.
    pub fn validate(&self) -> std::result::Result<(), Vec<ManifestError>> {
        let mut errors = self.retry.validate();

        let mut seen = HashSet::new();
        for (index, decl) in self.services.iter().enumerate() {
            if !decl.enabled {
                continue;
            }
            if !decl.name.is_empty() && !seen.insert(decl.name.as_str()) {
                errors.push(ManifestError::DuplicateName {
                    name: decl.name.clone(),
                });
            }
            errors.extend(decl.validate(index));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and flatten every violation into one error
    pub fn ensure_valid(&self) -> Result<()> {
        if let Err(errors) = self.validate() {
            let lines = errors
                .iter()
                .map(|e| format!("  - {e}"))
                .collect::<Vec<_>>()
                .join("\n");
            bail!("Manifest has {} error(s):\n{lines}", errors.len());
        }
        Ok(())
    }

    /// Enabled declarations, in manifest order
    pub fn active(&self) -> impl Iterator<Item = &ServiceDeclaration> {
        self.services.iter().filter(|s| s.enabled)
    }

    /// Disabled (inert) declarations, in manifest order
    pub fn disabled(&self) -> impl Iterator<Item = &ServiceDeclaration> {
        self.services.iter().filter(|s| !s.enabled)
    }

    /// Find a declaration by name, enabled or not
    pub fn find(&self, name: &str) -> Option<&ServiceDeclaration> {
        self.services.iter().find(|s| s.name == name)
    }
}

// ============================================================================
// ServiceDeclaration
// ============================================================================

/// One managed service and the action to apply to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDeclaration {
    /// Identifier of the declaration
    pub name: String,

    /// Service-manager mechanism
    #[serde(default)]
    pub provider: Provider,

    /// OS-level unit name, defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Lifecycle actions the service supports
    #[serde(default, deserialize_with = "deserialize_supports")]
    pub supports: BTreeSet<ServiceAction>,

    /// Action applied on every run
    #[serde(default = "default_action")]
    pub action: ServiceAction,

    /// Disabled declarations are parsed but never evaluated
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_action() -> ServiceAction {
    ServiceAction::Nothing
}

fn default_true() -> bool {
    true
}

impl ServiceDeclaration {
    /// Create an enabled declaration with no supported actions
    pub fn new(name: &str, action: ServiceAction) -> Self {
        Self {
            name: name.to_string(),
            provider: Provider::default(),
            service_name: None,
            supports: BTreeSet::new(),
            action,
            enabled: true,
            description: None,
        }
    }

    /// The unit name handed to the service manager
    pub fn unit_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether the declared action is allowed by `supports`
    ///
    /// `nothing` issues no OS call and is always allowed.
    pub fn action_supported(&self) -> bool {
        self.action == ServiceAction::Nothing || self.supports.contains(&self.action)
    }

    /// Comma-separated `supports` list
    pub fn supports_list(&self) -> String {
        self.supports
            .iter()
            .map(ServiceAction::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check this declaration on its own; `index` is its position in the manifest
    pub fn validate(&self, index: usize) -> Vec<ManifestError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ManifestError::EmptyName { index });
            return errors;
        }

        if !self.action_supported() {
            errors.push(ManifestError::UnsupportedAction {
                name: self.name.clone(),
                action: self.action,
                supports: self.supports_list(),
            });
        }

        if let Err(e) = unitkit::validate_unit_name(self.unit_name()) {
            let reason = match e {
                unitkit::Error::InvalidUnitName { reason, .. } => reason,
                other => other.to_string(),
            };
            errors.push(ManifestError::InvalidUnitName {
                name: self.name.clone(),
                unit: self.unit_name().to_string(),
                reason,
            });
        }

        errors
    }
}

/// `supports` as a list or as a table of booleans
#[derive(Deserialize)]
#[serde(untagged)]
enum SupportsRepr {
    List(Vec<String>),
    Table(BTreeMap<String, bool>),
}

fn deserialize_supports<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeSet<ServiceAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let names: Vec<String> = match SupportsRepr::deserialize(deserializer)? {
        SupportsRepr::List(list) => list,
        SupportsRepr::Table(table) => table
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect(),
    };

    names
        .iter()
        .map(|n| {
            n.parse::<ServiceAction>()
                .map_err(<D::Error as serde::de::Error>::custom)
        })
        .collect()
}

// ============================================================================
// Retry
// ============================================================================

/// The `[retry]` table of a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per action, 1 means no retry
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    10_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySettings {
    fn validate(&self) -> Vec<ManifestError> {
        let mut errors = Vec::new();
        if self.max_attempts == 0 {
            errors.push(ManifestError::InvalidRetry {
                reason: "max_attempts must be at least 1".into(),
            });
        }
        if self.backoff_factor.is_nan() || self.backoff_factor < 1.0 {
            errors.push(ManifestError::InvalidRetry {
                reason: format!("backoff_factor must be >= 1.0, got {}", self.backoff_factor),
            });
        }
        errors
    }

    pub fn to_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            backoff_factor: self.backoff_factor,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A manifest invariant violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("service #{index}: name must not be empty")]
    EmptyName { index: usize },

    #[error("service '{name}': declared more than once")]
    DuplicateName { name: String },

    #[error("service '{name}': action '{action}' is not in supports [{supports}]")]
    UnsupportedAction {
        name: String,
        action: ServiceAction,
        supports: String,
    },

    #[error("service '{name}': invalid service_name '{unit}': {reason}")]
    InvalidUnitName {
        name: String,
        unit: String,
        reason: String,
    },

    #[error("retry: {reason}")]
    InvalidRetry { reason: String },
}

// ============================================================================
// Tests
// ============================================================================
