//! Execution engine - applies resources with parallelism and privilege batching

use crate::context::{
    ApplyContext, AutoConfirm, ConfirmCallback, NoProgress, PrivilegeProvider, ProgressCallback,
};
use crate::diff::ResourceDiff;
use crate::planner::ExecutionPlan;
use crate::resource::{BoxedResource, Resource};
use crate::types::{ApplyResult, ExecuteOptions, ExecuteReport, Outcome, ResourceState};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use thiserror::Error;

/// A resource whose declaration was rejected before the run started
#[derive(Debug, Clone, Serialize)]
pub struct ValidationFailure {
    pub id: String,
    pub error: String,
}

/// Errors that abort a whole run
///
/// Per-resource failures are not errors here; they are reported as
/// [`ApplyResult::Failed`] outcomes.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("{} declaration(s) failed validation", .failures.len())]
    Validation { failures: Vec<ValidationFailure> },

    #[error("confirmation failed: {0}")]
    Confirm(String),

    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Where a resource stands after its state was observed
enum Evaluation<'a> {
    Settled(Outcome),
    Pending {
        resource: &'a dyn Resource,
        observed: ResourceState,
    },
}

impl Evaluation<'_> {
    fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Execute a plan with the given options and callbacks
///
/// Every resource is validated first; a single invalid declaration aborts
/// the run before any state is queried. Each remaining resource is then
/// observed once; the diffs of unconverged resources go to
/// [`ProgressCallback::on_plan`] before confirmation, and the observed state
/// is handed to `apply` through [`ApplyContext::observed`]. Converged
/// resources are reported as [`ApplyResult::NoChange`] without calling
/// `apply`.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, jobs, verbose)
/// * `privilege_provider` - Called lazily, only if a privileged resource needs applying
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback, not consulted in dry runs
///
/// # Returns
/// One outcome per resource, unprivileged batch first, each batch in plan order
pub fn execute<S, P, C>(
    plan: ExecutionPlan,
    opts: ExecuteOptions,
    privilege_provider: impl FnOnce() -> anyhow::Result<S>,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteReport, ExecuteError>
where
    S: PrivilegeProvider,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    validate_all(plan.resources())?;

    let mut diffs = Vec::new();
    let unprivileged = observe_batch(&plan.unprivileged, false, &mut diffs);
    let privileged = observe_batch(&plan.privileged, true, &mut diffs);
    progress.on_plan(&diffs);

    let pending = unprivileged
        .iter()
        .chain(privileged.iter())
        .filter(|e| e.is_pending())
        .count();

    let mut report = ExecuteReport::default();

    if pending == 0 {
        settle(unprivileged, Vec::new(), &mut report);
        settle(privileged, Vec::new(), &mut report);
        return Ok(report);
    }

    let skip_reason = if opts.dry_run {
        Some("dry run")
    } else if !confirm
        .confirm(&format!("Apply {pending} change(s)?"))
        .map_err(|e| ExecuteError::Confirm(format!("{e:#}")))?
    {
        Some("declined")
    } else {
        None
    };

    if let Some(reason) = skip_reason {
        log::info!("skipping {pending} change(s): {reason}");
        for batch in [unprivileged, privileged] {
            let skipped = skip_pending(&batch, reason);
            settle(batch, skipped, &mut report);
        }
        return Ok(report);
    }

    let count = unprivileged.iter().filter(|e| e.is_pending()).count();
    let applied = if count > 0 {
        progress.on_batch_start(count, false);
        let applied = apply_batch(&unprivileged, opts.jobs, opts.verbose, None, progress)?;
        progress.on_batch_complete();
        applied
    } else {
        Vec::new()
    };
    settle(unprivileged, applied, &mut report);

    let count = privileged.iter().filter(|e| e.is_pending()).count();
    let applied = if count > 0 {
        match privilege_provider() {
            Ok(provider) => {
                progress.on_batch_start(count, true);
                // Privileged commands share one credential, so run them one at a time
                let applied =
                    apply_batch(&privileged, 1, opts.verbose, Some(&provider), progress)?;
                progress.on_batch_complete();
                applied
            }
            Err(e) => {
                log::error!("could not acquire privileges: {e:#}");
                fail_pending(&privileged, &format!("privilege escalation failed: {e:#}"))
            }
        }
    } else {
        Vec::new()
    };
    settle(privileged, applied, &mut report);

    Ok(report)
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple<S: PrivilegeProvider>(
    plan: ExecutionPlan,
    opts: ExecuteOptions,
    privilege_provider: impl FnOnce() -> anyhow::Result<S>,
) -> Result<ExecuteReport, ExecuteError> {
    execute(plan, opts, privilege_provider, &mut NoProgress, &mut AutoConfirm)
}

/// Validate every resource, collecting all failures
pub fn validate_all<'a>(
    resources: impl IntoIterator<Item = &'a BoxedResource>,
) -> Result<(), ExecuteError> {
    let failures: Vec<ValidationFailure> = resources
        .into_iter()
        .filter_map(|r| {
            r.validate().err().map(|e| ValidationFailure {
                id: r.id(),
                error: format!("{e:#}"),
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(ExecuteError::Validation { failures })
    }
}

fn outcome(
    resource: &dyn Resource,
    observed: Option<ResourceState>,
    result: ApplyResult,
    started: Instant,
) -> Outcome {
    Outcome {
        id: resource.id(),
        resource_type: resource.resource_type().to_string(),
        description: resource.description(),
        observed,
        result,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

/// Observe every resource of a batch once, collecting a diff for each one
/// that is not converged
fn observe_batch<'a>(
    batch: &'a [BoxedResource],
    privileged: bool,
    diffs: &mut Vec<ResourceDiff>,
) -> Vec<Evaluation<'a>> {
    batch
        .iter()
        .map(|r| {
            let (evaluation, diff) = observe(r.as_ref());
            if let Some(mut diff) = diff {
                diff.requires_privilege = privileged;
                diffs.push(diff);
            }
            evaluation
        })
        .collect()
}

fn observe(resource: &dyn Resource) -> (Evaluation<'_>, Option<ResourceDiff>) {
    let started = Instant::now();
    match resource.current_state() {
        Ok(current) => {
            if resource.desired_state(&current) == current {
                log::debug!("{}: converged ({current})", resource.id());
                let settled = outcome(resource, Some(current), ApplyResult::NoChange, started);
                (Evaluation::Settled(settled), None)
            } else {
                let diff = ResourceDiff::from_observed(resource, current.clone(), None);
                let pending = Evaluation::Pending {
                    resource,
                    observed: current,
                };
                (pending, diff)
            }
        }
        Err(e) => {
            log::warn!("{}: status query failed: {e:#}", resource.id());
            let error = format!("{e:#}");
            let diff =
                ResourceDiff::from_observed(resource, ResourceState::Unknown, Some(error.clone()));
            let failed = outcome(
                resource,
                None,
                ApplyResult::Failed {
                    error: format!("status query failed: {error}"),
                },
                started,
            );
            (Evaluation::Settled(failed), diff)
        }
    }
}

/// Merge settled outcomes with applied ones, preserving batch order
///
/// `applied` holds exactly one outcome per pending evaluation, in order.
fn settle(batch: Vec<Evaluation<'_>>, applied: Vec<Outcome>, report: &mut ExecuteReport) {
    let mut applied = applied.into_iter();
    for evaluation in batch {
        match evaluation {
            Evaluation::Settled(outcome) => report.push(outcome),
            Evaluation::Pending { .. } => {
                if let Some(outcome) = applied.next() {
                    report.push(outcome);
                }
            }
        }
    }
}

fn pending<'a>(batch: &[Evaluation<'a>]) -> Vec<(&'a dyn Resource, ResourceState)> {
    batch
        .iter()
        .filter_map(|e| match e {
            Evaluation::Pending { resource, observed } => Some((*resource, observed.clone())),
            Evaluation::Settled(_) => None,
        })
        .collect()
}

fn skip_pending(batch: &[Evaluation<'_>], reason: &str) -> Vec<Outcome> {
    pending(batch)
        .into_iter()
        .map(|(resource, observed)| {
            outcome(
                resource,
                Some(observed),
                ApplyResult::Skipped {
                    reason: reason.to_string(),
                },
                Instant::now(),
            )
        })
        .collect()
}

fn fail_pending(batch: &[Evaluation<'_>], error: &str) -> Vec<Outcome> {
    pending(batch)
        .into_iter()
        .map(|(resource, observed)| {
            outcome(
                resource,
                Some(observed),
                ApplyResult::Failed {
                    error: error.to_string(),
                },
                Instant::now(),
            )
        })
        .collect()
}

/// Apply the pending resources of a batch
fn apply_batch<P: ProgressCallback>(
    batch: &[Evaluation<'_>],
    jobs: usize,
    verbose: bool,
    privileged: Option<&dyn PrivilegeProvider>,
    progress: &mut P,
) -> Result<Vec<Outcome>, ExecuteError> {
    let work = pending(batch);
    let parallel = jobs > 1 && work.len() > 1 && work.iter().all(|(r, _)| r.can_parallelize());

    if !parallel {
        let mut outcomes = Vec::with_capacity(work.len());
        for (resource, observed) in work {
            progress.on_resource_start(&resource.id(), &resource.description());
            let outcome = apply_resource(resource, observed, verbose, privileged);
            progress.on_resource_complete(&outcome.id, &outcome.result);
            outcomes.push(outcome);
        }
        return Ok(outcomes);
    }

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    // Progress callbacks are not thread-safe, so results are reported after the pool drains
    let outcomes: Vec<Outcome> = pool.install(|| {
        work.into_par_iter()
            .map(|(resource, observed)| apply_resource(resource, observed, verbose, privileged))
            .collect()
    });

    for outcome in &outcomes {
        progress.on_resource_complete(&outcome.id, &outcome.result);
    }

    Ok(outcomes)
}

/// Apply a single resource
fn apply_resource(
    resource: &dyn Resource,
    observed: ResourceState,
    verbose: bool,
    privileged: Option<&dyn PrivilegeProvider>,
) -> Outcome {
    let started = Instant::now();
    let ctx = match privileged {
        Some(p) => ApplyContext::with_privileges(false, verbose, p),
        None => ApplyContext::new(false, verbose),
    };
    let mut ctx = ctx.with_observed(observed.clone());

    let result = match resource.apply(&mut ctx) {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    };

    match &result {
        ApplyResult::Failed { error } => log::warn!("{}: {error}", resource.id()),
        other => log::info!("{}: {}", resource.id(), other.symbol()),
    }

    outcome(resource, Some(observed), result, started)
}
