//! `converge diff` - preview what apply would change

use anyhow::{Result, bail};
use reconcile::{ExecuteError, compute_diffs, validate_all};

use crate::Context;
use crate::engine::{self, differ};
use crate::ui;

pub fn run(ctx: &Context, target: Option<&str>) -> Result<()> {
    let (_, manifest) = super::load_manifest(ctx)?;
    manifest.ensure_valid()?;

    let plan = engine::build_plan(&manifest, target)?;
    if let Err(ExecuteError::Validation { failures }) = validate_all(plan.resources()) {
        for failure in &failures {
            ui::error(&format!("{}: {}", failure.id, failure.error));
        }
        bail!("{} declaration(s) failed validation", failures.len());
    }

    let diffs = compute_diffs(plan.resources());
    differ::display_diff(&diffs);
    differ::display_sudo_boundary(&diffs);
    Ok(())
}
