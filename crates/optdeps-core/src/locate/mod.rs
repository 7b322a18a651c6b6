//! Dependency locator.
//!
//! A dependency is located by running an ordered ladder of
//! [`ResolutionStrategy`] values; the first one that yields a file wins.

pub mod manifest;

use crate::bases::BaseCalculator;
use crate::resolver::ModuleResolver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

pub use manifest::{entry_candidates, package_entry};

/// One rung of the locator's fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// `require.resolve` from each base's `package.json`, one base at a time.
    RootQualified,
    /// A single multi-path lookup across all bases, then global folders.
    SearchPaths,
    /// Probe `<install root>/node_modules/<id>` directly.
    InstallRootPackage,
    /// Probe the package under each content-store directory of the install root.
    StoreRelative,
}

impl ResolutionStrategy {
    /// The full ladder in priority order.
    #[must_use]
    pub fn default_ladder() -> Vec<Self> {
        Self::all().to_vec()
    }

    #[must_use]
    pub fn all() -> [Self; 4] {
        [
            Self::RootQualified,
            Self::SearchPaths,
            Self::InstallRootPackage,
            Self::StoreRelative,
        ]
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RootQualified => "root-qualified",
            Self::SearchPaths => "search-paths",
            Self::InstallRootPackage => "install-root-package",
            Self::StoreRelative => "store-relative",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::all().iter().map(|st| st.as_str()).collect();
                format!("unknown strategy '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// A located dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    /// Absolute path of the resolved entry file.
    pub resolved_path: PathBuf,
    /// The base the path was resolved from.
    pub base_path: PathBuf,
    /// Strategy that produced the hit.
    pub strategy: ResolutionStrategy,
}

/// Runs the resolution strategy ladder.
#[derive(Debug, Clone)]
pub struct Locator {
    bases: BaseCalculator,
    resolver: Arc<dyn ModuleResolver>,
    strategies: Vec<ResolutionStrategy>,
}

impl Locator {
    #[must_use]
    pub fn new(
        bases: BaseCalculator,
        resolver: Arc<dyn ModuleResolver>,
        strategies: Vec<ResolutionStrategy>,
    ) -> Self {
        Self {
            bases,
            resolver,
            strategies,
        }
    }

    #[must_use]
    pub fn bases(&self) -> &BaseCalculator {
        &self.bases
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn ModuleResolver> {
        &self.resolver
    }

    #[must_use]
    pub fn strategies(&self) -> &[ResolutionStrategy] {
        &self.strategies
    }

    /// Locate `dependency_id` for `project_path`.
    ///
    /// `install_root` is passed in rather than queried so one call sees one
    /// consistent root across bases and probing.
    #[must_use]
    pub fn locate(
        &self,
        dependency_id: &str,
        project_path: &Path,
        install_root: Option<&Path>,
    ) -> Option<ResolutionResult> {
        let bases = self.bases.compute_with_root(project_path, install_root);
        self.locate_in(dependency_id, project_path, &bases, install_root)
    }

    /// Locate against precomputed bases.
    #[must_use]
    pub fn locate_in(
        &self,
        dependency_id: &str,
        project_path: &Path,
        bases: &[PathBuf],
        install_root: Option<&Path>,
    ) -> Option<ResolutionResult> {
        for &strategy in &self.strategies {
            match self.attempt(strategy, dependency_id, project_path, bases, install_root) {
                Some(result) => {
                    debug!(
                        dependency = dependency_id,
                        strategy = %strategy,
                        path = %result.resolved_path.display(),
                        base = %result.base_path.display(),
                        "dependency located"
                    );
                    return Some(result);
                }
                None => {
                    debug!(dependency = dependency_id, strategy = %strategy, "strategy missed");
                }
            }
        }
        None
    }

    /// Run a single strategy.
    #[must_use]
    pub fn attempt(
        &self,
        strategy: ResolutionStrategy,
        dependency_id: &str,
        project_path: &Path,
        bases: &[PathBuf],
        install_root: Option<&Path>,
    ) -> Option<ResolutionResult> {
        let hit = |resolved_path: PathBuf, base_path: &Path| ResolutionResult {
            resolved_path,
            base_path: base_path.to_path_buf(),
            strategy,
        };

        match strategy {
            ResolutionStrategy::RootQualified => bases.iter().find_map(|base| {
                self.resolver
                    .resolve_from(base, dependency_id)
                    .into_path()
                    .map(|path| hit(path, base))
            }),
            ResolutionStrategy::SearchPaths => self
                .resolver
                .resolve_from_paths(bases, dependency_id)
                .into_path()
                .map(|path| hit(path, project_path)),
            ResolutionStrategy::InstallRootPackage => {
                let root = install_root?;
                self.entry_under(root, dependency_id).map(|path| hit(path, root))
            }
            ResolutionStrategy::StoreRelative => {
                let root = install_root?;
                self.bases.store_dirs(root).into_iter().find_map(|dir| {
                    self.entry_under(&dir, dependency_id)
                        .map(|path| hit(path, &dir))
                })
            }
        }
    }

    fn entry_under(&self, root: &Path, dependency_id: &str) -> Option<PathBuf> {
        let package_dir = optdeps_util::path::node_modules_package_dir(root, dependency_id);
        package_entry(self.resolver.as_ref(), &package_dir)
    }
}
