//! `converge apply` - converge services to their declared actions

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use reconcile::ExecuteReport;
use serde::Serialize;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::engine::{self, ApplyOptions};
use crate::ui;

/// JSON document printed by `apply --json`
#[derive(Serialize)]
struct RunRecord<'a> {
    manifest: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    dry_run: bool,
    report: &'a ExecuteReport,
}

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let (path, manifest) = super::load_manifest(ctx)?;
    manifest.ensure_valid()?;

    let inert = manifest.disabled().count();
    if inert > 0 && !args.json && !ctx.quiet {
        ui::dim(&format!("{inert} inert declaration(s) skipped"));
    }

    let plan = engine::build_plan(&manifest, args.target.as_deref())?;
    let opts = ApplyOptions {
        dry_run: args.dry_run,
        jobs: usize::from(args.jobs),
        yes: args.yes,
        verbose: ctx.verbose > 0,
        json: args.json,
    };

    let started_at = Utc::now();
    let report = engine::apply(plan, &opts)?;

    if args.json {
        let record = RunRecord {
            manifest: path.display().to_string(),
            started_at,
            finished_at: Utc::now(),
            dry_run: args.dry_run,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&record)?);
    }

    if !report.is_success() {
        bail!("{} declaration(s) failed", report.summary.failed);
    }
    Ok(())
}
