use crate::install::PackageManager;
use crate::locate::ResolutionStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A package-manager content-store convention.
///
/// When any segment of the install root equals `marker`, the directory
/// `ancestor_levels` above the install root is searched as well. For pnpm
/// (`.../.pnpm/<pkg>@<ver>/node_modules/<pkg>`) that is the store entry whose
/// `node_modules` holds the hoisted siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLayout {
    pub marker: String,
    pub ancestor_levels: usize,
}

impl StoreLayout {
    /// The pnpm content-addressable store layout.
    #[must_use]
    pub fn pnpm() -> Self {
        Self {
            marker: ".pnpm".to_string(),
            ancestor_levels: 2,
        }
    }

    /// Whether `install_root` lives inside this store.
    #[must_use]
    pub fn matches(&self, install_root: &Path) -> bool {
        install_root
            .components()
            .any(|c| c.as_os_str() == self.marker.as_str())
    }

    /// The store-relative directory for `install_root`, if it is inside the store.
    #[must_use]
    pub fn store_dir(&self, install_root: &Path) -> Option<PathBuf> {
        if !self.matches(install_root) {
            return None;
        }
        install_root
            .ancestors()
            .nth(self.ancestor_levels)
            .map(Path::to_path_buf)
    }
}

/// `MARKER[:LEVELS]`, e.g. `.pnpm` or `.store:3`. Levels default to 2.
impl FromStr for StoreLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (marker, levels) = match s.rsplit_once(':') {
            Some((marker, levels)) => {
                let levels = levels
                    .parse()
                    .map_err(|_| format!("invalid ancestor levels in store layout '{s}'"))?;
                (marker, levels)
            }
            None => (s, 2),
        };
        if marker.is_empty() {
            return Err(format!("store layout '{s}' has an empty marker"));
        }
        Ok(Self {
            marker: marker.to_string(),
            ancestor_levels: levels,
        })
    }
}

/// Configuration for optional dependency resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionalDepsConfig {
    /// Working directory used as a resolution base. `None` reads the live
    /// process working directory on every call.
    pub cwd: Option<PathBuf>,

    /// Content-store layouts that add store-relative search directories.
    pub store_layouts: Vec<StoreLayout>,

    /// Locator fallback ladder, tried in order.
    pub strategies: Vec<ResolutionStrategy>,

    /// Package manager used by the shell-out installer. Detected when unset.
    pub package_manager: Option<PackageManager>,
}

impl Default for OptionalDepsConfig {
    fn default() -> Self {
        Self {
            cwd: None,
            store_layouts: vec![StoreLayout::pnpm()],
            strategies: ResolutionStrategy::default_ladder(),
            package_manager: None,
        }
    }
}

impl OptionalDepsConfig {
    /// Create a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the working-directory base.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Replace the store layouts.
    #[must_use]
    pub fn with_store_layouts(mut self, layouts: Vec<StoreLayout>) -> Self {
        self.store_layouts = layouts;
        self
    }

    /// Replace the locator fallback ladder.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<ResolutionStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Force a package manager for installs.
    #[must_use]
    pub fn with_package_manager(mut self, pm: PackageManager) -> Self {
        self.package_manager = Some(pm);
        self
    }

    /// The working directory base for this call.
    #[must_use]
    pub fn working_dir(&self) -> Option<PathBuf> {
        self.cwd
            .clone()
            .or_else(|| std::env::current_dir().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnpm_layout_store_dir() {
        let root = Path::new("/repo/node_modules/.pnpm/ext-develop@1.0.0/node_modules/ext-develop");
        let dir = StoreLayout::pnpm().store_dir(root).unwrap();
        assert_eq!(
            dir,
            PathBuf::from("/repo/node_modules/.pnpm/ext-develop@1.0.0")
        );
    }

    #[test]
    fn test_layout_requires_whole_segment() {
        let root = Path::new("/home/me/.pnpm-store/ext");
        assert!(!StoreLayout::pnpm().matches(root));
        assert!(StoreLayout::pnpm().store_dir(root).is_none());
    }

    #[test]
    fn test_parse_store_layout() {
        assert_eq!(".pnpm".parse::<StoreLayout>().unwrap(), StoreLayout::pnpm());
        let custom: StoreLayout = ".store:3".parse().unwrap();
        assert_eq!(custom.marker, ".store");
        assert_eq!(custom.ancestor_levels, 3);
        assert!(".store:x".parse::<StoreLayout>().is_err());
        assert!(":2".parse::<StoreLayout>().is_err());
    }

    #[test]
    fn test_custom_layout_replaces_pnpm() {
        let config = OptionalDepsConfig::new().with_store_layouts(vec![".store:1".parse().unwrap()]);
        let root = Path::new("/cache/.store/ext/node_modules");
        assert_eq!(config.store_layouts[0].store_dir(root), Some(PathBuf::from("/cache/.store/ext")));
        assert!(config.store_layouts[0]
            .store_dir(Path::new("/a/.pnpm/b/c"))
            .is_none());
    }

    #[test]
    fn test_default_config() {
        let config = OptionalDepsConfig::default();
        assert!(config.cwd.is_none());
        assert_eq!(config.store_layouts, vec![StoreLayout::pnpm()]);
        assert_eq!(config.strategies, ResolutionStrategy::default_ladder());
    }

    #[test]
    fn test_pinned_cwd_wins() {
        let config = OptionalDepsConfig::new().with_cwd("/work");
        assert_eq!(config.working_dir(), Some(PathBuf::from("/work")));
    }
}
