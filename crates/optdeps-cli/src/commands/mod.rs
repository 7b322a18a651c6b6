//! Subcommand implementations and their shared plumbing.

pub mod bases;
pub mod detect;
pub mod ensure;
pub mod load;
pub mod resolve;
pub mod version;

use miette::{IntoDiagnostic, Result};
use optdeps_core::{
    version::OUTPUT_SCHEMA_VERSION, DependencyRequest, EnvInstallRoot, FixedInstallRoot,
    Integration, InstallRootProvider, OptionalDeps, OptionalDepsConfig, OptionalDepsError,
    PackageManager, PackageManagerInstaller, ResolutionStrategy, StoreLayout,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Global options every command sees.
#[derive(Debug, Clone)]
pub struct Context {
    pub project: PathBuf,
    pub json: bool,
    pub install_root: Option<PathBuf>,
    pub package_manager: Option<PackageManager>,
    pub strategies: Vec<ResolutionStrategy>,
    pub store_layouts: Vec<StoreLayout>,
}

impl Context {
    /// `--install-root` wins over `OPTDEPS_INSTALL_ROOT`.
    pub fn provider(&self) -> Arc<dyn InstallRootProvider> {
        match &self.install_root {
            Some(root) => Arc::new(FixedInstallRoot::new(root.clone())),
            None => Arc::new(EnvInstallRoot),
        }
    }

    /// Config from the global flags; unset flags keep the defaults.
    pub fn config(&self) -> OptionalDepsConfig {
        let mut config = OptionalDepsConfig::new();
        if let Some(pm) = self.package_manager {
            config = config.with_package_manager(pm);
        }
        if !self.strategies.is_empty() {
            config = config.with_strategies(self.strategies.clone());
        }
        if !self.store_layouts.is_empty() {
            config = config.with_store_layouts(self.store_layouts.clone());
        }
        config
    }

    pub fn service(&self) -> OptionalDeps {
        let provider = self.provider();
        let config = self.config();
        let installer = Arc::new(PackageManagerInstaller::from_config(
            Arc::clone(&provider),
            &config,
        ));
        OptionalDeps::new(installer, provider, config)
    }

    /// Request for `integration`, optionally overriding the catalog entry.
    pub fn request(
        &self,
        integration: Integration,
        dependency: Option<String>,
        install: Vec<String>,
        verify: Vec<String>,
    ) -> DependencyRequest {
        let mut request = match dependency {
            Some(dep) => DependencyRequest::new(integration.label(), self.project.clone(), dep),
            None => integration.request(&self.project),
        };
        if !install.is_empty() {
            request = request.with_install_dependencies(install);
        }
        if !verify.is_empty() {
            request = request.with_verify_package_ids(verify);
        }
        request
    }
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    schema_version: u32,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    ok: bool,
    schema_version: u32,
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a optdeps_core::Diagnostics>,
}

/// Print a successful result as `{"ok": true, ...}`.
pub fn print_json<T: Serialize>(body: &T) -> Result<()> {
    let envelope = Envelope {
        ok: true,
        schema_version: OUTPUT_SCHEMA_VERSION,
        body,
    };
    let text = serde_json::to_string_pretty(&envelope).into_diagnostic()?;
    println!("{text}");
    Ok(())
}

/// Report an optional dependency failure and exit with status 1.
///
/// In JSON mode the error goes to stdout as `{"ok": false, "error": ...}`;
/// otherwise it becomes a miette report.
pub fn fail(ctx: &Context, err: OptionalDepsError) -> Result<()> {
    if !ctx.json {
        if err.is_install_error() {
            return Err(miette::miette!(
                help = "the package manager output is logged above",
                "{err}"
            ));
        }
        return Err(miette::miette!("{err}"));
    }
    let envelope = ErrorEnvelope {
        ok: false,
        schema_version: OUTPUT_SCHEMA_VERSION,
        error: ErrorBody {
            code: err.code(),
            message: err.to_string(),
            diagnostics: err.diagnostics(),
        },
    };
    let text = serde_json::to_string_pretty(&envelope).into_diagnostic()?;
    println!("{text}");
    std::process::exit(1);
}
