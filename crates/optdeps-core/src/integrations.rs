//! Catalog of optional integrations.

use crate::request::DependencyRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// An optional CSS preprocessor or JS framework integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Integration {
    Sass,
    Less,
    React,
    Preact,
    Vue,
}

impl Integration {
    pub const ALL: [Self; 5] = [Self::Sass, Self::Less, Self::React, Self::Preact, Self::Vue];

    /// Label used as the `[<label>]` error prefix.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Sass => "Sass",
            Self::Less => "LESS",
            Self::React => "React",
            Self::Preact => "Preact",
            Self::Vue => "Vue",
        }
    }

    /// Project dependency that switches the integration on.
    #[must_use]
    pub fn trigger(self) -> &'static str {
        match self {
            Self::Sass => "sass",
            Self::Less => "less",
            Self::React => "react",
            Self::Preact => "preact",
            Self::Vue => "vue",
        }
    }

    /// The loader or plugin package the build needs resolved.
    #[must_use]
    pub fn dependency_id(self) -> &'static str {
        match self {
            Self::Sass => "sass-loader",
            Self::Less => "less-loader",
            Self::React => "react-refresh",
            Self::Preact => "@rspack/plugin-preact-refresh",
            Self::Vue => "vue-loader",
        }
    }

    /// Packages installed together when the dependency is missing.
    #[must_use]
    pub fn install_dependencies(self) -> &'static [&'static str] {
        match self {
            Self::Sass => &["sass", "sass-loader"],
            Self::Less => &["less", "less-loader"],
            Self::React => &["react-refresh", "@rspack/plugin-react-refresh"],
            Self::Preact => &[
                "@prefresh/core",
                "@prefresh/utils",
                "@rspack/plugin-preact-refresh",
                "preact",
            ],
            Self::Vue => &["vue-loader", "@vue/compiler-sfc"],
        }
    }

    /// Request for this integration's dependency in `project_path`.
    #[must_use]
    pub fn request(self, project_path: &Path) -> DependencyRequest {
        DependencyRequest::new(self.label(), project_path, self.dependency_id())
            .with_install_dependencies(self.install_dependencies().iter().copied())
    }

    /// Whether the project at `project_path` depends on the trigger package.
    #[must_use]
    pub fn is_used_by(self, project_path: &Path) -> bool {
        has_dependency(project_path, self.trigger())
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Integration {
    type Err = String;

    /// Accepts the trigger name or the label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.trigger().eq_ignore_ascii_case(s) || i.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|i| i.trigger()).collect();
                format!("unknown integration '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Whether `name` appears in the project's `dependencies` or `devDependencies`.
#[must_use]
pub fn has_dependency(project_path: &Path, name: &str) -> bool {
    read_project_manifest(project_path).is_some_and(|manifest| declares(&manifest, name))
}

/// Every integration the project uses, in catalog order.
#[must_use]
pub fn detect_integrations(project_path: &Path) -> Vec<Integration> {
    let Some(manifest) = read_project_manifest(project_path) else {
        return Vec::new();
    };
    Integration::ALL
        .into_iter()
        .filter(|i| declares(&manifest, i.trigger()))
        .collect()
}

fn declares(manifest: &Value, name: &str) -> bool {
    ["dependencies", "devDependencies"].iter().any(|field| {
        manifest
            .get(*field)
            .and_then(Value::as_object)
            .is_some_and(|deps| deps.contains_key(name))
    })
}

fn read_project_manifest(project_path: &Path) -> Option<Value> {
    let text = optdeps_util::fs::read_manifest_text(&project_path.join("package.json")).ok()?;
    serde_json::from_str(&text).ok()
}
