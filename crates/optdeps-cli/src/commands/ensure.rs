//! `optdeps ensure`: resolve, installing into the install root if needed.

use super::Context;
use miette::Result;
use optdeps_core::Integration;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct EnsureOutput {
    integration: String,
    dependency: String,
    path: PathBuf,
}

pub fn run(
    ctx: &Context,
    integration: Integration,
    dependency: Option<String>,
    install: Vec<String>,
    verify: Vec<String>,
) -> Result<()> {
    let service = ctx.service();
    let request = ctx.request(integration, dependency, install, verify);

    let rt = super::runtime()?;
    let path = match rt.block_on(service.ensure_package_resolved(&request)) {
        Ok(path) => path,
        Err(e) => return super::fail(ctx, e),
    };

    if ctx.json {
        super::print_json(&EnsureOutput {
            integration: request.integration,
            dependency: request.dependency_id,
            path,
        })
    } else {
        println!("{}", path.display());
        Ok(())
    }
}
