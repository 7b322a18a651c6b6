//! Manifest-guided package entry probing.
//!
//! Linked and content-addressed trees sometimes hold a package that bare
//! specifier lookup cannot reach. Given the package directory itself, try it
//! as a directory module, then walk the manifest's entry fields in a fixed
//! order and take the first file that exists.

use crate::resolver::ModuleResolver;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Literal entry files tried after every manifest field.
const INDEX_ENTRIES: &[&str] = &["index.js", "index.cjs", "index.mjs"];

/// Conditions read from an `exports["."]` object, in lookup order.
const DOT_EXPORT_CONDITIONS: &[&str] = &["require", "default", "import"];

/// Resolve the entry file of the package at `package_dir`.
#[must_use]
pub fn package_entry(resolver: &dyn ModuleResolver, package_dir: &Path) -> Option<PathBuf> {
    if !optdeps_util::fs::exists(package_dir) {
        return None;
    }

    if let Some(path) = resolver.resolve_directory(package_dir).into_path() {
        return Some(path);
    }

    let manifest = resolver.read_package_json(&package_dir.join("package.json"))?;
    first_existing_entry(package_dir, &entry_candidates(&manifest))
}

/// Candidate entries: `main`, `module`, string `exports`, string
/// `exports["."]`, `exports["."].require`/`default`/`import`, then `index.*`.
#[must_use]
pub fn entry_candidates(manifest: &Value) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut push_str = |value: Option<&Value>| {
        if let Some(s) = value.and_then(Value::as_str) {
            candidates.push(s.to_string());
        }
    };

    push_str(manifest.get("main"));
    push_str(manifest.get("module"));

    let exports = manifest.get("exports");
    push_str(exports.filter(|e| e.is_string()));

    let dot = exports.and_then(|e| e.get("."));
    push_str(dot.filter(|d| d.is_string()));
    if let Some(dot) = dot.filter(|d| d.is_object()) {
        for condition in DOT_EXPORT_CONDITIONS {
            push_str(dot.get(*condition));
        }
    }

    candidates.extend(INDEX_ENTRIES.iter().map(|s| (*s).to_string()));
    candidates
}

fn first_existing_entry(package_dir: &Path, candidates: &[String]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|entry| optdeps_util::path::resolve(package_dir, entry))
        .find(|path| path.is_file())
}
