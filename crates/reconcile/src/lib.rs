//! # Reconcile
//!
//! A small engine for desired-state reconciliation.
//!
//! Declare what a resource should look like, observe what it looks like now,
//! issue the minimal action to converge, and report the outcome per resource.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something on the host with observable state (a service unit)
//! - **ResourceState**: The current or desired state of a resource
//! - **ExecutionPlan**: Resources grouped by privilege level
//! - **Executor**: Validates, observes, and applies a plan, producing an [`ExecuteReport`]
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{DeclaredPrivilege, ExecuteOptions, ExecutionPlan, execute_simple};
//!
//! let mut plan = ExecutionPlan::new();
//! plan.add_resource(Box::new(my_resource), &DeclaredPrivilege);
//!
//! let report = execute_simple(plan, ExecuteOptions::default(), || {
//!     anyhow::bail!("no privileges in this example")
//! })?;
//!
//! for outcome in &report.outcomes {
//!     println!("{} {}", outcome.result.symbol(), outcome.id);
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`PrivilegeProvider`]: Runs commands with elevated privileges
//! - [`PrivilegeClassifier`]: Decides which resources need privileges
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! None of these tie the engine to a terminal UI or a sudo implementation.

pub mod context;
pub mod diff;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;

pub use context::{
    ApplyContext, AutoConfirm, AutoDecline, ConfirmCallback, DeclaredPrivilege, NoPrivilege,
    NoProgress, PrivilegeClassifier, PrivilegeProvider, ProgressCallback,
};
pub use diff::{ChangeKind, DiffSummary, ResourceDiff, compute_diffs, group_by_type};
pub use executor::{ExecuteError, ValidationFailure, execute, execute_simple, validate_all};
pub use planner::{ExecutionPlan, Target};
pub use resource::{BoxedResource, Resource, ResourceExt};
pub use types::{
    ApplyResult, CommandOutput, ExecuteOptions, ExecuteReport, ExecuteSummary, Outcome, Privilege,
    ResourceState,
};
