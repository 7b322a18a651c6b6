//! `optdeps detect`: integrations declared in package.json.

use super::Context;
use miette::Result;
use optdeps_core::{detect_integrations, Integration};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct DetectedIntegration {
    name: Integration,
    label: &'static str,
    dependency: &'static str,
    resolved: Option<PathBuf>,
}

#[derive(Serialize)]
struct DetectOutput {
    project: PathBuf,
    integrations: Vec<DetectedIntegration>,
}

pub fn run(ctx: &Context) -> Result<()> {
    let service = ctx.service();
    let integrations: Vec<DetectedIntegration> = detect_integrations(&ctx.project)
        .into_iter()
        .map(|integration| DetectedIntegration {
            name: integration,
            label: integration.label(),
            dependency: integration.dependency_id(),
            resolved: service
                .resolve_sync(integration.dependency_id(), &ctx.project)
                .ok(),
        })
        .collect();

    if ctx.json {
        return super::print_json(&DetectOutput {
            project: ctx.project.clone(),
            integrations,
        });
    }

    if integrations.is_empty() {
        println!("no optional integrations in use");
    }
    for item in &integrations {
        match &item.resolved {
            Some(path) => println!("{:<8} {} -> {}", item.label, item.dependency, path.display()),
            None => println!("{:<8} {} (not installed)", item.label, item.dependency),
        }
    }
    Ok(())
}
