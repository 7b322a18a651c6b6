//! Module loading.
//!
//! A resolved dependency is loaded through a short-circuiting sequence of
//! attempts: per base, by bare id then by resolved path, and finally a
//! direct load of the resolved path. Only the last error is kept.

use crate::resolver::{ModuleResolver, NodeResolver};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

/// Loader failure. Only the message reaches diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    #[error("Cannot find module '{specifier}' from '{}'", .base.display())]
    NotResolvable { specifier: String, base: PathBuf },

    #[error("Cannot read module '{}': {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("Invalid JSON in '{}': {message}", .path.display())]
    InvalidJson { path: PathBuf, message: String },

    #[error("Native addon '{}' cannot be loaded", .path.display())]
    NativeAddon { path: PathBuf },
}

/// Module format of a loaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    #[serde(rename = "commonjs")]
    CommonJs,
    #[serde(rename = "module")]
    EsModule,
    Json,
}

impl ModuleKind {
    /// Format of `path`: from the extension, or for `.js` (and extensionless
    /// files) the nearest `package.json` `"type"`.
    #[must_use]
    pub fn detect(path: &Path, resolver: &dyn ModuleResolver) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("mjs") => Self::EsModule,
            Some("cjs") => Self::CommonJs,
            Some("json") => Self::Json,
            _ => {
                let is_module = path
                    .ancestors()
                    .skip(1)
                    .find_map(|dir| resolver.read_package_json(&dir.join("package.json")))
                    .and_then(|pkg| pkg.get("type").and_then(Value::as_str).map(|t| t == "module"))
                    .unwrap_or(false);
                if is_module {
                    Self::EsModule
                } else {
                    Self::CommonJs
                }
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommonJs => "commonjs",
            Self::EsModule => "module",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A module read from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedModule {
    pub path: PathBuf,
    pub kind: ModuleKind,
    pub source: String,
}

/// Root-qualified and direct module loading.
pub trait ModuleLoader: Send + Sync + fmt::Debug {
    type Module;

    /// Load `specifier` as if required from a module at `base`.
    fn load_from(&self, base: &Path, specifier: &str) -> Result<Self::Module, LoaderError>;

    /// Load the file (or directory module) at `path`.
    fn load_path(&self, path: &Path) -> Result<Self::Module, LoaderError>;
}

/// Loads module source through a [`ModuleResolver`], caching by resolved path.
#[derive(Debug)]
pub struct SourceLoader {
    resolver: Arc<dyn ModuleResolver>,
    cache: RwLock<HashMap<PathBuf, LoadedModule>>,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new(Arc::new(NodeResolver::new()))
    }
}

impl SourceLoader {
    #[must_use]
    pub fn new(resolver: Arc<dyn ModuleResolver>) -> Self {
        Self {
            resolver,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached modules.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn read(&self, path: &Path) -> Result<LoadedModule, LoaderError> {
        if let Some(module) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(module.clone());
        }

        let kind = match path.extension().and_then(|e| e.to_str()) {
            Some("node") => {
                return Err(LoaderError::NativeAddon {
                    path: path.to_path_buf(),
                })
            }
            _ => ModuleKind::detect(path, self.resolver.as_ref()),
        };

        let source = optdeps_util::fs::read_source(path).map_err(|e| LoaderError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if kind == ModuleKind::Json {
            serde_json::from_str::<Value>(&source).map_err(|e| LoaderError::InvalidJson {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let module = LoadedModule {
            path: path.to_path_buf(),
            kind,
            source,
        };
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), module.clone());
        Ok(module)
    }
}

impl ModuleLoader for SourceLoader {
    type Module = LoadedModule;

    fn load_from(&self, base: &Path, specifier: &str) -> Result<LoadedModule, LoaderError> {
        let resolved = self
            .resolver
            .resolve_from(base, specifier)
            .into_path()
            .ok_or_else(|| LoaderError::NotResolvable {
                specifier: specifier.to_string(),
                base: base.to_path_buf(),
            })?;
        self.read(&resolved)
    }

    fn load_path(&self, path: &Path) -> Result<LoadedModule, LoaderError> {
        if path.is_file() {
            return self.read(path);
        }
        let resolved = self
            .resolver
            .resolve_directory(path)
            .into_path()
            .ok_or_else(|| LoaderError::NotResolvable {
                specifier: path.display().to_string(),
                base: path.to_path_buf(),
            })?;
        self.read(&resolved)
    }
}

/// One load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadAttempt<'a> {
    /// Bare dependency id, root-qualified at `base`.
    BareId { base: &'a Path },
    /// Resolved absolute path, root-qualified at `base`.
    ResolvedPath { base: &'a Path },
    /// Resolved absolute path, loaded directly.
    Direct,
}

/// Attempts in order: for each base, bare id then resolved path; then direct.
pub fn load_attempts(bases: &[PathBuf]) -> impl Iterator<Item = LoadAttempt<'_>> {
    bases
        .iter()
        .flat_map(|base| {
            [
                LoadAttempt::BareId { base },
                LoadAttempt::ResolvedPath { base },
            ]
        })
        .chain(std::iter::once(LoadAttempt::Direct))
}

/// Run [`load_attempts`] until one succeeds.
///
/// Returns the last error when every attempt fails.
pub fn load_first<L>(
    loader: &L,
    bases: &[PathBuf],
    dependency_id: &str,
    resolved_path: &Path,
) -> Result<L::Module, LoaderError>
where
    L: ModuleLoader + ?Sized,
{
    let resolved_specifier = resolved_path.to_string_lossy();
    let mut last_error = None;

    for attempt in load_attempts(bases) {
        let result = match attempt {
            LoadAttempt::BareId { base } => loader.load_from(base, dependency_id),
            LoadAttempt::ResolvedPath { base } => loader.load_from(base, &resolved_specifier),
            LoadAttempt::Direct => loader.load_path(resolved_path),
        };
        match result {
            Ok(module) => {
                debug!(dependency = dependency_id, ?attempt, "module loaded");
                return Ok(module);
            }
            Err(e) => {
                trace!(dependency = dependency_id, ?attempt, error = %e, "load attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| LoaderError::NotResolvable {
        specifier: dependency_id.to_string(),
        base: resolved_path.to_path_buf(),
    }))
}
