//! Execution engine - converge's executor with UI integration

use anyhow::{Result, bail};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use reconcile::{
    ApplyResult, ConfirmCallback, ExecuteError, ExecuteOptions, ExecuteReport, ExecutionPlan,
    ProgressCallback, ResourceDiff,
};

use crate::sudo::SudoContext;
use crate::ui;

use super::differ::{display_diff, display_sudo_boundary};

/// Options for a converge run (adds UI switches to the engine options)
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
    /// Machine-readable output only: no diff, no progress, no summary
    pub json: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            yes: false,
            verbose: false,
            json: false,
        }
    }
}

/// Diff display and progress bar driven by the reconcile executor
struct BarProgress {
    bar: Option<ProgressBar>,
    hidden: bool,
    dry_run: bool,
}

impl BarProgress {
    fn new(hidden: bool, dry_run: bool) -> Self {
        Self {
            bar: None,
            hidden,
            dry_run,
        }
    }
}

impl ProgressCallback for BarProgress {
    fn on_plan(&mut self, diffs: &[ResourceDiff]) {
        if self.hidden {
            return;
        }
        display_diff(diffs);
        if !self.dry_run {
            display_sudo_boundary(diffs);
        }
    }

    fn on_batch_start(&mut self, count: usize, privileged: bool) {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(count as u64)
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message(if privileged {
            "privileged"
        } else {
            "unprivileged"
        });
        self.bar = Some(bar);
    }

    fn on_resource_start(&mut self, id: &str, description: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{id}: {description}"));
        }
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{} {id}", result.symbol()));
            bar.inc(1);
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Interactive confirmation, refused on a non-interactive terminal
struct PromptConfirm {
    assume_yes: bool,
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if !console::user_attended() {
            bail!("Refusing to prompt on a non-interactive terminal; pass --yes to apply");
        }

        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        if !confirmed {
            println!();
            println!("  {} Aborted", "✗".red());
        }
        Ok(confirmed)
    }
}

/// Execute the plan with converge's UI integration
///
/// The diff is drawn from the executor's single observation of each service.
pub fn apply(plan: ExecutionPlan, opts: &ApplyOptions) -> Result<ExecuteReport> {
    let engine_opts = ExecuteOptions {
        dry_run: opts.dry_run,
        jobs: opts.jobs,
        verbose: opts.verbose,
    };

    let result = reconcile::execute(
        plan,
        engine_opts,
        || SudoContext::acquire("Converge privileged service actions"),
        &mut BarProgress::new(opts.json, opts.dry_run),
        &mut PromptConfirm {
            assume_yes: opts.yes,
        },
    );

    let report = match result {
        Ok(report) => report,
        Err(ExecuteError::Validation { failures }) => {
            for failure in &failures {
                ui::error(&format!("{}: {}", failure.id, failure.error));
            }
            bail!(
                "{} declaration(s) failed validation; no service was touched",
                failures.len()
            );
        }
        Err(e) => return Err(e.into()),
    };

    if !opts.json {
        print_outcomes(&report);
        print_summary(&report, opts.dry_run);
    }

    Ok(report)
}

/// Print one line per outcome
pub fn print_outcomes(report: &ExecuteReport) {
    if report.outcomes.is_empty() {
        return;
    }

    println!();
    for outcome in &report.outcomes {
        let detail = ui::result_detail(&outcome.result);
        let detail = match &outcome.result {
            ApplyResult::Failed { .. } => detail.red(),
            _ => detail.dimmed(),
        };
        println!(
            "  {} {:<30} {}",
            ui::result_symbol(&outcome.result),
            outcome.id,
            detail
        );
    }
}

/// Print final summary
fn print_summary(report: &ExecuteReport, dry_run: bool) {
    let summary = &report.summary;

    println!();
    if dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.is_success() {
        println!("  {} Services converged", "✓".green().bold());
    } else {
        println!("  {} Converged with errors", "⚠".yellow().bold());
    }

    if summary.changed > 0 {
        println!("    • {} services changed", summary.changed);
    }
    if summary.no_change > 0 {
        println!("    • {} services already converged", summary.no_change);
    }
    if summary.skipped > 0 {
        println!("    • {} services skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "services".red());
    }
}
