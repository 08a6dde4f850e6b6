//! `converge validate` - check the manifest without touching any service

use anyhow::{Result, bail};

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let (path, manifest) = super::load_manifest(ctx)?;

    if let Err(errors) = manifest.validate() {
        ui::error(&format!("{} is invalid", path.display()));
        for error in &errors {
            eprintln!("  - {error}");
        }
        bail!("Manifest has {} error(s)", errors.len());
    }

    for decl in manifest.disabled() {
        ui::warn(&format!("{} is disabled and will not be evaluated", decl.name));
    }

    ui::success(&format!(
        "{} is valid ({} active, {} inert)",
        path.display(),
        manifest.active().count(),
        manifest.disabled().count()
    ));
    Ok(())
}
