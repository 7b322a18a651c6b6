//! Dependency requests.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One resolution attempt for an optional dependency.
///
/// `install_dependencies` defaults to `[dependency_id]` and
/// `verify_package_ids` defaults to the install list. An explicitly empty
/// list stays empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRequest {
    /// Integration label, used as the error prefix.
    pub integration: String,
    pub project_path: PathBuf,
    pub dependency_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_dependencies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_package_ids: Option<Vec<String>>,
}

impl DependencyRequest {
    #[must_use]
    pub fn new(
        integration: impl Into<String>,
        project_path: impl Into<PathBuf>,
        dependency_id: impl Into<String>,
    ) -> Self {
        Self {
            integration: integration.into(),
            project_path: project_path.into(),
            dependency_id: dependency_id.into(),
            install_dependencies: None,
            verify_package_ids: None,
        }
    }

    /// Packages handed to the installer.
    #[must_use]
    pub fn with_install_dependencies<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install_dependencies = Some(packages.into_iter().map(Into::into).collect());
        self
    }

    /// Packages that must exist at the install root after installing.
    #[must_use]
    pub fn with_verify_package_ids<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verify_package_ids = Some(packages.into_iter().map(Into::into).collect());
        self
    }

    /// The install list with its default applied.
    #[must_use]
    pub fn install_dependencies(&self) -> Vec<String> {
        self.install_dependencies
            .clone()
            .unwrap_or_else(|| vec![self.dependency_id.clone()])
    }

    /// The verify list with its default applied.
    #[must_use]
    pub fn verify_package_ids(&self) -> Vec<String> {
        self.verify_package_ids
            .clone()
            .unwrap_or_else(|| self.install_dependencies())
    }
}
