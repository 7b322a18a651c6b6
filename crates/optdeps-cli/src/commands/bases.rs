//! `optdeps bases`: the directories a dependency is resolved from.

use super::Context;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct BasesOutput {
    project: PathBuf,
    install_root: Option<PathBuf>,
    bases: Vec<PathBuf>,
    store_dirs: Vec<PathBuf>,
}

pub fn run(ctx: &Context) -> Result<()> {
    let service = ctx.service();
    let install_root = service.install_root();
    let bases = service
        .locator()
        .bases()
        .compute_with_root(&ctx.project, install_root.as_deref());
    let store_dirs = install_root
        .as_deref()
        .map(|root| service.locator().bases().store_dirs(root))
        .unwrap_or_default();

    if ctx.json {
        return super::print_json(&BasesOutput {
            project: ctx.project.clone(),
            install_root,
            bases,
            store_dirs,
        });
    }

    match &install_root {
        Some(root) => println!("install root: {}", root.display()),
        None => println!("install root: (none)"),
    }
    for base in &bases {
        if store_dirs.contains(base) {
            println!("  {} (store)", base.display());
        } else {
            println!("  {}", base.display());
        }
    }
    Ok(())
}
