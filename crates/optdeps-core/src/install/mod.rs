//! Install coordination.
//!
//! The install primitive is opaque: it receives an integration label and a
//! package list and reports success as a bool. Deduplication lives in
//! [`InstallRegistry`], on-disk checks in [`verify`].

pub mod command;
pub mod single_flight;
pub mod verify;

use async_trait::async_trait;
use std::fmt;

pub use command::{PackageManager, PackageManagerInstaller, USER_AGENT_ENV};
pub use single_flight::{InstallKey, InstallOutcome, InstallRegistry, MISSING_INSTALL_ROOT};
pub use verify::{missing_packages, verify_exists};

/// The external install primitive.
#[async_trait]
pub trait Installer: Send + Sync + fmt::Debug {
    /// Install `packages` for `integration`. `true` means the installer
    /// reported success; callers still verify the result on disk.
    async fn install(&self, integration: &str, packages: &[String]) -> bool;
}
