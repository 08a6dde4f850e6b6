//! `converge list` - list declarations, including inert ones

use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::schema::ServiceDeclaration;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let (path, manifest) = super::load_manifest(ctx)?;

    ui::header("Service Declarations");
    ui::kv("Manifest", &path.display().to_string());
    println!();

    if manifest.services.is_empty() {
        ui::info("No services declared");
        return Ok(());
    }

    for decl in &manifest.services {
        println!("{}", line(decl));
        if let Some(description) = &decl.description {
            ui::dim(description);
        }
    }

    Ok(())
}

fn line(decl: &ServiceDeclaration) -> String {
    let name = if decl.enabled {
        decl.name.bold()
    } else {
        decl.name.dimmed()
    };
    let state = if decl.enabled {
        String::new()
    } else {
        format!(" {}", "[inert]".yellow())
    };

    let supports = format!("supports: {}", decl.supports_list());

    format!(
        "  {:<24} {:<8} {:<10} {} {}{}",
        name,
        decl.provider.as_str(),
        decl.action.as_str(),
        decl.unit_name().dimmed(),
        supports.dimmed(),
        state
    )
}
