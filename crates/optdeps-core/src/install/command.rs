//! Package-manager backed install primitive.

use super::Installer;
use crate::bases::InstallRootProvider;
use crate::config::OptionalDepsConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Environment variable set by package managers when running scripts.
pub const USER_AGENT_ENV: &str = "npm_config_user_agent";

/// Lockfiles that identify a package manager, checked in order.
const LOCKFILES: &[(&str, PackageManager)] = &[
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("yarn.lock", PackageManager::Yarn),
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("package-lock.json", PackageManager::Npm),
];

/// Maximum stderr bytes echoed into a failure log.
const STDERR_TAIL: usize = 2048;

/// A supported package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    pub const ALL: [Self; 4] = [Self::Npm, Self::Pnpm, Self::Yarn, Self::Bun];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }

    /// Parse `npm_config_user_agent`, e.g. `pnpm/9.1.0 npm/? node/v20.11.0 linux x64`.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Option<Self> {
        let name = user_agent.split_whitespace().next()?.split('/').next()?;
        name.parse().ok()
    }

    /// Detect from a lockfile in `dir`.
    #[must_use]
    pub fn from_lockfile(dir: &Path) -> Option<Self> {
        LOCKFILES
            .iter()
            .find(|(name, _)| dir.join(name).is_file())
            .map(|(_, pm)| *pm)
    }

    /// Configured manager, then user agent, then lockfile, then npm.
    #[must_use]
    pub fn detect(configured: Option<Self>, install_root: &Path) -> Self {
        configured
            .or_else(|| {
                std::env::var(USER_AGENT_ENV)
                    .ok()
                    .and_then(|ua| Self::from_user_agent(&ua))
            })
            .or_else(|| Self::from_lockfile(install_root))
            .unwrap_or(Self::Npm)
    }

    /// Executable name for this platform.
    #[must_use]
    pub fn executable(self) -> String {
        if cfg!(windows) {
            match self {
                Self::Bun => "bun.exe".to_string(),
                other => format!("{}.cmd", other.as_str()),
            }
        } else {
            self.as_str().to_string()
        }
    }

    /// Arguments that add `packages` to the current directory.
    #[must_use]
    pub fn install_args(self, packages: &[String]) -> Vec<String> {
        let mut args: Vec<String> = match self {
            Self::Npm => ["install", "--no-save", "--no-audit", "--no-fund"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            Self::Pnpm | Self::Yarn | Self::Bun => vec!["add".to_string()],
        };
        args.extend(packages.iter().cloned());
        args
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|pm| pm.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown package manager: {s}"))
    }
}

/// Installs packages by running the detected package manager in the
/// install root.
#[derive(Debug, Clone)]
pub struct PackageManagerInstaller {
    provider: Arc<dyn InstallRootProvider>,
    package_manager: Option<PackageManager>,
}

impl PackageManagerInstaller {
    #[must_use]
    pub fn new(provider: Arc<dyn InstallRootProvider>, package_manager: Option<PackageManager>) -> Self {
        Self {
            provider,
            package_manager,
        }
    }

    /// Installer honouring `config.package_manager`.
    #[must_use]
    pub fn from_config(provider: Arc<dyn InstallRootProvider>, config: &OptionalDepsConfig) -> Self {
        Self::new(provider, config.package_manager)
    }

    fn locate_executable(pm: PackageManager) -> Option<PathBuf> {
        match which::which(pm.executable()) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(manager = %pm, error = %e, "package manager not found on PATH");
                None
            }
        }
    }
}

#[async_trait]
impl Installer for PackageManagerInstaller {
    async fn install(&self, integration: &str, packages: &[String]) -> bool {
        let Some(root) = self.provider.install_root() else {
            warn!(integration, "no install root, cannot install optional dependencies");
            return false;
        };
        if packages.is_empty() {
            debug!(integration, "nothing to install");
            return true;
        }

        if let Err(e) = tokio::fs::create_dir_all(&root).await {
            warn!(root = %root.display(), error = %e, "failed to create install root");
            return false;
        }

        let pm = PackageManager::detect(self.package_manager, &root);
        let Some(program) = Self::locate_executable(pm) else {
            return false;
        };

        info!(
            integration,
            manager = %pm,
            packages = %packages.join(" "),
            root = %root.display(),
            "installing optional dependencies"
        );

        let output = Command::new(&program)
            .args(pm.install_args(packages))
            .current_dir(&root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                info!(integration, manager = %pm, "optional dependencies installed");
                true
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let start = stderr.len().saturating_sub(STDERR_TAIL);
                let tail = stderr.get(start..).unwrap_or(&stderr);
                warn!(
                    integration,
                    manager = %pm,
                    status = %output.status,
                    stderr = %tail.trim(),
                    "package manager exited with failure"
                );
                false
            }
            Err(e) => {
                warn!(integration, manager = %pm, error = %e, "failed to spawn package manager");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bases::{FixedInstallRoot, NoInstallRoot};
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_from_user_agent() {
        assert_eq!(
            PackageManager::from_user_agent("pnpm/9.1.0 npm/? node/v20.11.0 linux x64"),
            Some(PackageManager::Pnpm)
        );
        assert_eq!(
            PackageManager::from_user_agent("yarn/1.22.19 npm/? node/v18.0.0"),
            Some(PackageManager::Yarn)
        );
        assert_eq!(PackageManager::from_user_agent("deno/1.0"), None);
        assert_eq!(PackageManager::from_user_agent(""), None);
    }

    #[test]
    fn test_from_lockfile() {
        let dir = tempdir().unwrap();
        assert_eq!(PackageManager::from_lockfile(dir.path()), None);
        fs::write(dir.path().join("bun.lock"), "").unwrap();
        assert_eq!(PackageManager::from_lockfile(dir.path()), Some(PackageManager::Bun));
        fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(PackageManager::from_lockfile(dir.path()), Some(PackageManager::Pnpm));
    }

    #[test]
    #[serial]
    fn test_detect_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("yarn.lock"), "").unwrap();

        std::env::set_var(USER_AGENT_ENV, "bun/1.1.0");
        assert_eq!(
            PackageManager::detect(Some(PackageManager::Npm), dir.path()),
            PackageManager::Npm
        );
        assert_eq!(PackageManager::detect(None, dir.path()), PackageManager::Bun);

        std::env::remove_var(USER_AGENT_ENV);
        assert_eq!(PackageManager::detect(None, dir.path()), PackageManager::Yarn);

        let empty = tempdir().unwrap();
        assert_eq!(PackageManager::detect(None, empty.path()), PackageManager::Npm);
    }

    #[test]
    fn test_install_args() {
        let pkgs = vec!["sass".to_string(), "sass-loader".to_string()];
        assert_eq!(
            PackageManager::Npm.install_args(&pkgs),
            vec!["install", "--no-save", "--no-audit", "--no-fund", "sass", "sass-loader"]
        );
        assert_eq!(PackageManager::Pnpm.install_args(&pkgs), vec!["add", "sass", "sass-loader"]);
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!("PNPM".parse::<PackageManager>().unwrap(), PackageManager::Pnpm);
        assert!("cargo".parse::<PackageManager>().is_err());
        assert_eq!(serde_json::to_string(&PackageManager::Yarn).unwrap(), "\"yarn\"");
    }

    #[test]
    fn test_from_config_uses_configured_manager() {
        let provider: Arc<dyn InstallRootProvider> = Arc::new(NoInstallRoot);
        let config = OptionalDepsConfig::new().with_package_manager(PackageManager::Pnpm);
        let installer = PackageManagerInstaller::from_config(Arc::clone(&provider), &config);
        assert_eq!(installer.package_manager, Some(PackageManager::Pnpm));

        let detected = PackageManagerInstaller::from_config(provider, &OptionalDepsConfig::new());
        assert_eq!(detected.package_manager, None);
    }

    #[tokio::test]
    async fn test_no_install_root_reports_failure() {
        let installer = PackageManagerInstaller::new(Arc::new(NoInstallRoot), None);
        assert!(!installer.install("Sass", &["sass".to_string()]).await);
    }

    #[tokio::test]
    async fn test_empty_package_list_succeeds() {
        let root = tempdir().unwrap();
        let installer = PackageManagerInstaller::new(
            Arc::new(FixedInstallRoot::new(root.path())),
            Some(PackageManager::Npm),
        );
        assert!(installer.install("Vue", &[]).await);
    }
}
