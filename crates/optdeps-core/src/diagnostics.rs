//! Failure diagnostics.
//!
//! A [`Diagnostics`] snapshot is only built on failure paths. Its pretty JSON
//! form is appended to every error message, and tooling parses it, so the
//! key names are stable.

use crate::bases::BaseCalculator;
use crate::install::verify_exists;
use crate::request::DependencyRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Existence of one verify package at the install root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyState {
    pub dependency: String,
    pub exists_at_install_root: bool,
}

/// Snapshot embedded in optional dependency errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub integration: String,
    pub dependency_id: String,
    pub project_path: PathBuf,
    /// Serialized as `null` when unknown.
    pub install_root: Option<PathBuf>,
    pub install_dependencies: Vec<String>,
    pub verify_package_ids: Vec<String>,
    pub resolution_bases: Vec<PathBuf>,
    pub verify_state: Vec<VerifyState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

impl Diagnostics {
    /// Build a snapshot for `request` against `install_root`.
    ///
    /// Verify packages are all reported missing when there is no install root.
    pub async fn build(
        request: &DependencyRequest,
        bases: &BaseCalculator,
        install_root: Option<&Path>,
    ) -> Self {
        let verify_package_ids = request.verify_package_ids();
        let mut verify_state = Vec::with_capacity(verify_package_ids.len());
        for id in &verify_package_ids {
            let exists_at_install_root = match install_root {
                Some(root) => verify_exists(id, root).await,
                None => false,
            };
            verify_state.push(VerifyState {
                dependency: id.clone(),
                exists_at_install_root,
            });
        }

        Self {
            integration: request.integration.clone(),
            dependency_id: request.dependency_id.clone(),
            project_path: request.project_path.clone(),
            install_root: install_root.map(Path::to_path_buf),
            install_dependencies: request.install_dependencies(),
            verify_package_ids,
            resolution_bases: bases.compute_with_root(&request.project_path, install_root),
            verify_state,
            resolved_path: None,
            load_error: None,
        }
    }

    /// Attach the resolved path and last loader error of a failed load.
    #[must_use]
    pub fn with_load_failure(mut self, resolved_path: PathBuf, load_error: impl Into<String>) -> Self {
        self.resolved_path = Some(resolved_path);
        self.load_error = Some(load_error.into());
        self
    }

    /// Pretty JSON, two-space indented.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json_pretty() {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}
