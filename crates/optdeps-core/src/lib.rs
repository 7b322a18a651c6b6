#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::return_self_not_must_use)]

//! Optional dependency resolution for pluggable build integrations.
//!
//! Resolves a loader/plugin package across several install roots, installs
//! it on demand exactly once under concurrent callers, verifies the install
//! on disk and loads the resulting module.

pub mod bases;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod install;
pub mod integrations;
pub mod load;
pub mod locate;
pub mod request;
pub mod resolver;
pub mod service;
pub mod version;

pub use bases::{BaseCalculator, EnvInstallRoot, FixedInstallRoot, InstallRootProvider, NoInstallRoot};
pub use config::{OptionalDepsConfig, StoreLayout};
pub use diagnostics::{Diagnostics, VerifyState};
pub use error::{codes, OptionalDepsError};
pub use install::{
    InstallKey, InstallOutcome, InstallRegistry, Installer, PackageManager,
    PackageManagerInstaller,
};
pub use integrations::{detect_integrations, has_dependency, Integration};
pub use load::{load_first, LoadAttempt, LoadedModule, LoaderError, ModuleKind, ModuleLoader, SourceLoader};
pub use locate::{Locator, ResolutionResult, ResolutionStrategy};
pub use request::DependencyRequest;
pub use resolver::{ModuleResolver, NodeResolver, ResolveResult};
pub use service::OptionalDeps;
pub use version::VERSION;
