//! Diff computation for resources

use crate::resource::{Resource, ResourceExt};
use crate::types::ResourceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What converging a resource will do, derived from its state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Start,
    Stop,
    Restart,
    Reload,
    Enable,
    Disable,
    /// The resource does not exist, so converging it will fail
    Missing,
    /// Current state could not be read
    Unknown,
}

impl ChangeKind {
    /// Diff marker for terminal output
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Start | Self::Enable => "+",
            Self::Stop | Self::Disable => "-",
            Self::Restart | Self::Reload => "~",
            Self::Missing => "!",
            Self::Unknown => "?",
        }
    }
}

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    pub resource_id: String,
    pub resource_type: String,
    pub description: String,
    pub current: ResourceState,
    pub desired: ResourceState,
    /// Set when the current state could not be read
    pub error: Option<String>,
    pub requires_privilege: bool,
}

impl ResourceDiff {
    /// Create a diff from a resource, returning None if no changes needed
    ///
    /// A failed state query is not dropped: it becomes a diff with
    /// [`ResourceState::Unknown`] so the failure surfaces when applied.
    pub fn from_resource(resource: &dyn Resource) -> Option<Self> {
        let (current, error) = match resource.current_state() {
            Ok(state) => (state, None),
            Err(e) => (ResourceState::Unknown, Some(format!("{e:#}"))),
        };
        Self::from_observed(resource, current, error)
    }

    /// Create a diff from an already-observed state
    pub fn from_observed(
        resource: &dyn Resource,
        current: ResourceState,
        error: Option<String>,
    ) -> Option<Self> {
        let desired = resource.desired_state(&current);

        if error.is_none() && current == desired {
            return None;
        }

        Some(Self {
            resource_id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            current,
            desired,
            error,
            requires_privilege: resource.requires_privilege(),
        })
    }

    /// Classify the transition
    pub fn kind(&self) -> ChangeKind {
        if self.error.is_some() {
            return ChangeKind::Unknown;
        }
        match (&self.current, &self.desired) {
            (ResourceState::Absent, _) => ChangeKind::Missing,
            (_, ResourceState::Restarted) => ChangeKind::Restart,
            (_, ResourceState::Reloaded) => ChangeKind::Reload,
            (_, ResourceState::Running) => ChangeKind::Start,
            (_, ResourceState::Stopped) => ChangeKind::Stop,
            (_, ResourceState::Enabled) => ChangeKind::Enable,
            (_, ResourceState::Disabled) => ChangeKind::Disable,
            _ => ChangeKind::Unknown,
        }
    }
}

/// Compute diffs for a list of resources
///
/// Returns only resources that have differences between current and desired state.
pub fn compute_diffs<'a>(
    resources: impl IntoIterator<Item = &'a Box<dyn Resource>>,
) -> Vec<ResourceDiff> {
    resources
        .into_iter()
        .filter_map(|r| ResourceDiff::from_resource(r.as_ref()))
        .collect()
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    pub by_kind: BTreeMap<ChangeKind, usize>,
    /// Number of diffs needing elevated privileges
    pub privileged: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            *summary.by_kind.entry(diff.kind()).or_default() += 1;
            if diff.requires_privilege {
                summary.privileged += 1;
            }
        }
        summary
    }

    /// Count diffs of one kind
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.by_kind.values().sum()
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type
pub fn group_by_type(diffs: &[ResourceDiff]) -> BTreeMap<String, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<String, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.clone())
            .or_default()
            .push(diff);
    }
    groups
}
