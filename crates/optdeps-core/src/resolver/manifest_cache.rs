//! Parsed `package.json` cache.
//!
//! The locator reads the same manifests once per base and strategy, and
//! again after an install. Entries remember the file length and mtime they
//! were parsed from; a manifest rewritten by the package manager no longer
//! matches and is re-read.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;
use tracing::trace;

/// On-disk identity of a manifest at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestStamp {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl ManifestStamp {
    /// `None` when the file is gone.
    #[must_use]
    pub fn read(path: &Path) -> Option<Self> {
        let meta = path.metadata().ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Storage for parsed manifests, shared by every resolution on a resolver.
pub trait ManifestCache: Send + Sync + fmt::Debug {
    /// Parsed manifest at `path`, if cached and unchanged on disk.
    fn lookup(&self, path: &Path) -> Option<Value>;

    /// Remember `manifest` as the parse of `path`.
    fn store(&self, path: &Path, manifest: Value);

    /// Forget every manifest under `dir`.
    fn invalidate_under(&self, dir: &Path);
}

/// Process-local manifest cache.
#[derive(Debug, Default)]
pub struct MemoryManifestCache {
    entries: RwLock<HashMap<PathBuf, (ManifestStamp, Value)>>,
}

impl MemoryManifestCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ManifestCache for MemoryManifestCache {
    fn lookup(&self, path: &Path) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let (stamp, manifest) = entries.get(path)?;
        if ManifestStamp::read(path).as_ref() == Some(stamp) {
            return Some(manifest.clone());
        }
        trace!(path = %path.display(), "manifest changed on disk");
        None
    }

    fn store(&self, path: &Path, manifest: Value) {
        // A manifest that vanished between read and store is not worth keeping.
        let Some(stamp) = ManifestStamp::read(path) else {
            return;
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), (stamp, manifest));
    }

    fn invalidate_under(&self, dir: &Path) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|path, _| !path.starts_with(dir));
        trace!(dir = %dir.display(), dropped = before - entries.len(), "invalidated manifests");
    }
}
