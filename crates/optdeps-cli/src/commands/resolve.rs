//! `optdeps resolve`: synchronous lookup, never installs.

use super::Context;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ResolveOutput<'a> {
    dependency: &'a str,
    path: PathBuf,
}

pub fn run(ctx: &Context, dependency: &str) -> Result<()> {
    let service = ctx.service();
    let path = match service.resolve_sync(dependency, &ctx.project) {
        Ok(path) => path,
        Err(e) => return super::fail(ctx, e),
    };

    if ctx.json {
        super::print_json(&ResolveOutput { dependency, path })
    } else {
        println!("{}", path.display());
        Ok(())
    }
}
