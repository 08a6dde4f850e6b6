//! Resource trait for desired-state reconciliation
//!
//! A Resource is something on the host with observable state and a way to
//! move that state toward what was declared.

use crate::context::ApplyContext;
use crate::types::{ApplyResult, Privilege, ResourceState};
use anyhow::Result;
use std::fmt;

/// Core trait for reconcilable resources
///
/// Every resource provides:
/// - Identity (id, description, type)
/// - Static validation, run before anything touches the host
/// - State detection (current vs desired)
/// - State convergence (apply)
/// - Privilege requirements
///
/// # Example
///
/// ```ignore
/// use reconcile::{ApplyContext, ApplyResult, Resource, ResourceState};
///
/// #[derive(Debug)]
/// struct PidFile { path: String }
///
/// impl Resource for PidFile {
///     fn id(&self) -> String { self.path.clone() }
///     fn description(&self) -> String { format!("pid file {}", self.path) }
///     fn resource_type(&self) -> &'static str { "pidfile" }
///
///     fn current_state(&self) -> anyhow::Result<ResourceState> {
///         Ok(if std::path::Path::new(&self.path).exists() {
///             ResourceState::Running
///         } else {
///             ResourceState::Stopped
///         })
///     }
///
///     fn desired_state(&self, _current: &ResourceState) -> ResourceState {
///         ResourceState::Running
///     }
///
///     fn apply(&self, ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
///         if ctx.dry_run {
///             return Ok(ApplyResult::Skipped { reason: "dry run".into() });
///         }
///         std::fs::write(&self.path, std::process::id().to_string())?;
///         Ok(ApplyResult::Changed { action: "write".into() })
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Unique identifier for this resource within its type
    fn id(&self) -> String;

    /// Human-readable description of what converging this resource does
    fn description(&self) -> String;

    /// Resource type category, used for grouping and target filters
    fn resource_type(&self) -> &'static str;

    /// Whether this resource requires elevated privileges
    fn privilege(&self) -> Privilege {
        Privilege::None
    }

    /// Check the declaration itself, without touching the host
    ///
    /// The executor validates every resource in a plan before querying or
    /// applying any of them.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Detect the current state of this resource
    fn current_state(&self) -> Result<ResourceState>;

    /// The state this resource should be in, given what was observed
    ///
    /// Returning `current` unchanged means "nothing to do". Imperative
    /// resources return a state that never equals an observed one.
    fn desired_state(&self, current: &ResourceState) -> ResourceState;

    /// Check if the resource needs changes to reach desired state
    fn needs_apply(&self) -> Result<bool> {
        let current = self.current_state()?;
        let desired = self.desired_state(&current);
        Ok(current != desired)
    }

    /// Apply changes to reach the desired state
    ///
    /// This method should:
    /// 1. Respect ctx.dry_run (return Skipped if true)
    /// 2. Make the necessary changes
    /// 3. Return the appropriate ApplyResult
    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;

    /// Whether this resource can be applied in parallel with others
    fn can_parallelize(&self) -> bool {
        true
    }
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;

/// Extension trait for working with resources
pub trait ResourceExt {
    /// Check if the resource declares that it needs privileges
    fn requires_privilege(&self) -> bool;
}

impl<R: Resource + ?Sized> ResourceExt for R {
    fn requires_privilege(&self) -> bool {
        matches!(self.privilege(), Privilege::Required { .. })
    }
}
