//! Apply context and provider traits
//!
//! These traits keep the engine free of any particular sudo
//! implementation, progress UI, or prompt library.

use crate::diff::ResourceDiff;
use crate::resource::Resource;
use crate::types::{ApplyResult, CommandOutput, Privilege, ResourceState};
use anyhow::Result;

/// Provider for elevated privilege operations
///
/// The implementation handles privilege acquisition and release.
pub trait PrivilegeProvider: Send + Sync {
    /// Run a command with elevated privileges
    fn run(&self, cmd: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Decides which resources go into the privileged batch
pub trait PrivilegeClassifier: Send + Sync {
    fn requires_privilege(&self, resource: &dyn Resource) -> bool;
}

/// Classifier that never requires privileges
pub struct NoPrivilege;

impl PrivilegeClassifier for NoPrivilege {
    fn requires_privilege(&self, _resource: &dyn Resource) -> bool {
        false
    }
}

/// Classifier that trusts each resource's own [`Resource::privilege`]
pub struct DeclaredPrivilege;

impl PrivilegeClassifier for DeclaredPrivilege {
    fn requires_privilege(&self, resource: &dyn Resource) -> bool {
        matches!(resource.privilege(), Privilege::Required { .. })
    }
}

/// Progress callback for execution operations
pub trait ProgressCallback: Send {
    /// Called once after every resource was observed, before confirmation
    ///
    /// `diffs` holds one entry per resource that is not converged, including
    /// resources whose state could not be read.
    fn on_plan(&mut self, _diffs: &[ResourceDiff]) {}

    /// Called when starting to apply a batch of resources
    fn on_batch_start(&mut self, count: usize, privileged: bool);

    /// Called when starting to apply a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action; `true` to proceed
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _count: usize, _privileged: bool) {}
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

/// Context passed to resource apply operations
pub struct ApplyContext<'a> {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
    /// Privilege provider, present only in the privileged batch
    pub privileged: Option<&'a dyn PrivilegeProvider>,
    /// State the executor observed for this resource, if any
    pub observed: Option<ResourceState>,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self {
            dry_run,
            verbose,
            privileged: None,
            observed: None,
        }
    }

    /// Create a context with a privilege provider
    pub fn with_privileges(
        dry_run: bool,
        verbose: bool,
        provider: &'a dyn PrivilegeProvider,
    ) -> Self {
        Self {
            dry_run,
            verbose,
            privileged: Some(provider),
            observed: None,
        }
    }

    /// Attach the state observed before applying, so `apply` need not query again
    pub fn with_observed(mut self, state: ResourceState) -> Self {
        self.observed = Some(state);
        self
    }

    /// Get the privilege provider, or error if not available
    pub fn require_privileges(&self) -> Result<&dyn PrivilegeProvider> {
        self.privileged
            .ok_or_else(|| anyhow::anyhow!("Elevated privileges required but not available"))
    }
}
