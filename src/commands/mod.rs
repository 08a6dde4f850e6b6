pub mod apply;
pub mod diff;
pub mod list;
pub mod status;
pub mod validate;

use anyhow::Result;
use std::path::PathBuf;

use crate::Context;
use crate::paths;
use crate::schema::Manifest;

/// Resolve and load the manifest for this invocation
pub fn load_manifest(ctx: &Context) -> Result<(PathBuf, Manifest)> {
    let path = paths::manifest_path(ctx.manifest.as_deref())?;
    log::info!("manifest: {}", path.display());
    let manifest = Manifest::load(&path)?;
    Ok((path, manifest))
}
