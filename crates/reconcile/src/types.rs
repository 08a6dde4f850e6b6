//! Core types for desired-state reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output from a privileged command, shared with the service-manager client
pub use unitkit::CommandOutput;

/// Privilege level a resource needs to converge
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Privilege {
    /// Runs as the invoking user
    #[default]
    None,
    /// Needs elevated privileges, with a reason shown to the user
    Required { reason: String },
}

/// Current or desired state of a managed resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResourceState {
    /// Resource is up
    Running,
    /// Resource exists but is down
    Stopped,
    /// Resource starts at boot
    Enabled,
    /// Resource does not start at boot
    Disabled,
    /// Resource does not exist on this host
    Absent,
    /// Resource was (or must be) restarted during this run
    Restarted,
    /// Resource was (or must be) reloaded during this run
    Reloaded,
    /// State observed without judging it against a target
    Observed { details: String },
    /// State cannot be determined
    Unknown,
}

impl ResourceState {
    /// Check if state represents absence
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Short label for display
    pub fn label(&self) -> String {
        match self {
            Self::Running => "running".to_string(),
            Self::Stopped => "stopped".to_string(),
            Self::Enabled => "enabled".to_string(),
            Self::Disabled => "disabled".to_string(),
            Self::Absent => "absent".to_string(),
            Self::Restarted => "restarted".to_string(),
            Self::Reloaded => "reloaded".to_string(),
            Self::Observed { details } => details.clone(),
            Self::Unknown => "unknown".to_string(),
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Result of applying a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ApplyResult {
    /// Already converged
    NoChange,
    /// An action was performed
    Changed { action: String },
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    /// Single-character marker for terminal output
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::NoChange => "○",
            Self::Changed { .. } => "✓",
            Self::Failed { .. } => "✗",
            Self::Skipped { .. } => "⊘",
        }
    }
}

/// Outcome of evaluating one resource in a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub resource_type: String,
    pub description: String,
    /// State observed before apply, if it could be read
    pub observed: Option<ResourceState>,
    pub result: ApplyResult,
    pub duration_ms: u64,
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub changed: usize,
    pub no_change: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.changed + self.no_change + self.skipped + self.failed
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.changed += other.changed;
        self.no_change += other.no_change;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Changed { .. } => self.changed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Per-resource outcomes of one run, plus totals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteReport {
    pub outcomes: Vec<Outcome>,
    pub summary: ExecuteSummary,
}

impl ExecuteReport {
    /// Record an outcome
    pub fn push(&mut self, outcome: Outcome) {
        self.summary.add_result(&outcome.result);
        self.outcomes.push(outcome);
    }

    /// Find the outcome for a resource id
    pub fn outcome(&self, id: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }

    pub fn is_success(&self) -> bool {
        self.summary.is_success()
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs for unprivileged operations
    pub jobs: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            verbose: false,
        }
    }
}
