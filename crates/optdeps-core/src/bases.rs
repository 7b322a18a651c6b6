//! Resolution bases: the ordered directories a dependency is searched from.
//!
//! Order is project path, install root, working directory, then any
//! content-store directories derived from the install root. Bases are
//! recomputed on every call because the install root can change between
//! calls (CI vs local).

use crate::config::{OptionalDepsConfig, StoreLayout};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable read by [`EnvInstallRoot`].
pub const INSTALL_ROOT_ENV: &str = "OPTDEPS_INSTALL_ROOT";

/// Supplies the external root where optional packages are installed.
pub trait InstallRootProvider: Send + Sync + fmt::Debug {
    /// The current install root, if one is known.
    fn install_root(&self) -> Option<PathBuf>;
}

/// Reads the install root from `OPTDEPS_INSTALL_ROOT` on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvInstallRoot;

impl InstallRootProvider for EnvInstallRoot {
    fn install_root(&self) -> Option<PathBuf> {
        std::env::var_os(INSTALL_ROOT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

/// A fixed install root.
#[derive(Debug, Clone, Default)]
pub struct FixedInstallRoot(pub Option<PathBuf>);

impl FixedInstallRoot {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(Some(root.into()))
    }
}

impl InstallRootProvider for FixedInstallRoot {
    fn install_root(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// No install root is ever known.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInstallRoot;

impl InstallRootProvider for NoInstallRoot {
    fn install_root(&self) -> Option<PathBuf> {
        None
    }
}

/// Computes resolution bases.
#[derive(Debug, Clone)]
pub struct BaseCalculator {
    provider: Arc<dyn InstallRootProvider>,
    config: OptionalDepsConfig,
}

impl BaseCalculator {
    #[must_use]
    pub fn new(provider: Arc<dyn InstallRootProvider>, config: OptionalDepsConfig) -> Self {
        Self { provider, config }
    }

    /// Query the install-root provider.
    #[must_use]
    pub fn install_root(&self) -> Option<PathBuf> {
        self.provider.install_root()
    }

    /// Store layouts in effect.
    #[must_use]
    pub fn store_layouts(&self) -> &[StoreLayout] {
        &self.config.store_layouts
    }

    /// Ordered, de-duplicated resolution bases for `project_path`.
    #[must_use]
    pub fn compute(&self, project_path: &Path) -> Vec<PathBuf> {
        let install_root = self.install_root();
        self.compute_with_root(project_path, install_root.as_deref())
    }

    /// Same as [`compute`](Self::compute) with an already-queried install root.
    #[must_use]
    pub fn compute_with_root(&self, project_path: &Path, install_root: Option<&Path>) -> Vec<PathBuf> {
        let mut bases: Vec<PathBuf> = Vec::with_capacity(4);

        push_unique(&mut bases, project_path.to_path_buf());
        if let Some(root) = install_root {
            push_unique(&mut bases, root.to_path_buf());
        }
        if let Some(cwd) = self.config.working_dir() {
            push_unique(&mut bases, cwd);
        }
        if let Some(root) = install_root {
            for dir in self.store_dirs(root) {
                push_unique(&mut bases, dir);
            }
        }

        bases
    }

    /// Store-relative directories for `install_root`, one per matching layout.
    #[must_use]
    pub fn store_dirs(&self, install_root: &Path) -> Vec<PathBuf> {
        self.config
            .store_layouts
            .iter()
            .filter_map(|layout| layout.store_dir(install_root))
            .collect()
    }
}

fn push_unique(bases: &mut Vec<PathBuf>, path: PathBuf) {
    if !bases.contains(&path) {
        bases.push(path);
    }
}
