//! `optdeps load`: ensure, then read the dependency's entry module.

use super::Context;
use miette::Result;
use optdeps_core::{Integration, LoadedModule, ModuleKind, SourceLoader};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct LoadOutput {
    integration: String,
    dependency: String,
    path: PathBuf,
    kind: ModuleKind,
    bytes: usize,
}

pub fn run(ctx: &Context, integration: Integration, dependency: Option<String>) -> Result<()> {
    let service = ctx.service();
    let request = ctx.request(integration, dependency, Vec::new(), Vec::new());
    let loader = SourceLoader::default();

    let rt = super::runtime()?;
    let loaded = rt.block_on(service.ensure_module_loaded_with(
        &request,
        &loader,
        |module: LoadedModule| (module.path, module.kind, module.source.len()),
    ));
    let (path, kind, bytes) = match loaded {
        Ok(summary) => summary,
        Err(e) => return super::fail(ctx, e),
    };

    if ctx.json {
        super::print_json(&LoadOutput {
            integration: request.integration,
            dependency: request.dependency_id,
            path,
            kind,
            bytes,
        })
    } else {
        println!("{} ({kind}, {bytes} bytes)", path.display());
        Ok(())
    }
}
