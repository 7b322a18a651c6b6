//! CommonJS-flavoured Node resolution.
//!
//! Supports:
//! - Relative and absolute specifiers (file, then extension probing, then directory)
//! - Bare specifiers via `node_modules` lookup walking up from the base
//! - Package `exports` (root, subpaths, `*` patterns) under `require` conditions
//! - `main` and `index.*` for packages without `exports` and for plain directories
//! - Package self-reference for root-qualified resolution
//! - Global folders (`NODE_PATH`, `~/.node_modules`, `~/.node_libraries`) for
//!   multi-path resolution

use super::exports::{exports_root, exports_subpath, REQUIRE_CONDITIONS};
use super::manifest_cache::{ManifestCache, MemoryManifestCache};
use serde_json::Value;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions tried when a specifier does not name an existing file.
pub const CJS_EXTENSIONS: &[&str] = &[".js", ".cjs", ".mjs", ".json", ".node"];

/// Environment variable listing extra global module folders.
pub const NODE_PATH_ENV: &str = "NODE_PATH";

/// Maximum number of tried paths to record.
const MAX_TRIED_PATHS: usize = 32;

/// Resolution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    Resolved,
    Unresolved,
}

/// Reason codes for unresolved specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveReasonCode {
    SpecifierInvalid,
    UnsupportedScheme,
    NotFound,
    IsDirectory,
    NodeModulesNotFound,
    /// `exports` matched but the target file does not exist.
    ExportsTargetNotFound,
    /// `exports` exists but has no entry for the requested subpath.
    ExportsNotFound,
}

impl fmt::Display for ResolveReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SpecifierInvalid => "SPECIFIER_INVALID",
            Self::UnsupportedScheme => "UNSUPPORTED_SCHEME",
            Self::NotFound => "NOT_FOUND",
            Self::IsDirectory => "IS_DIRECTORY",
            Self::NodeModulesNotFound => "NODE_MODULES_NOT_FOUND",
            Self::ExportsTargetNotFound => "EXPORTS_TARGET_NOT_FOUND",
            Self::ExportsNotFound => "EXPORTS_NOT_FOUND",
        };
        write!(f, "{s}")
    }
}

/// Resolution result.
#[derive(Debug, Clone)]
pub struct ResolveResult {
    /// Resolved absolute path (if successful).
    pub resolved: Option<PathBuf>,
    pub status: ResolveStatus,
    /// Reason code if unresolved.
    pub reason: Option<ResolveReasonCode>,
    /// Candidate paths tried (capped).
    pub tried: Vec<PathBuf>,
}

impl ResolveResult {
    fn resolved(path: PathBuf, tried: &[PathBuf]) -> Self {
        Self {
            resolved: Some(path),
            status: ResolveStatus::Resolved,
            reason: None,
            tried: tried.to_vec(),
        }
    }

    fn unresolved(reason: ResolveReasonCode, tried: &[PathBuf]) -> Self {
        Self {
            resolved: None,
            status: ResolveStatus::Unresolved,
            reason: Some(reason),
            tried: tried.to_vec(),
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == ResolveStatus::Resolved
    }

    /// The resolved path, discarding diagnostics.
    #[must_use]
    pub fn into_path(self) -> Option<PathBuf> {
        self.resolved
    }
}

/// Module resolution primitive consumed by the locator and loader.
pub trait ModuleResolver: Send + Sync + fmt::Debug {
    /// Resolve `specifier` as if required from a module located at `base`.
    fn resolve_from(&self, base: &Path, specifier: &str) -> ResolveResult;

    /// Resolve `specifier` against an ordered list of base directories.
    fn resolve_from_paths(&self, paths: &[PathBuf], specifier: &str) -> ResolveResult;

    /// Resolve a directory as a module (`main`, then `index.*`).
    fn resolve_directory(&self, dir: &Path) -> ResolveResult;

    /// Read and parse a `package.json`.
    fn read_package_json(&self, path: &Path) -> Option<Value>;

    /// Drop cached manifests under `dir`, e.g. after an install wrote there.
    fn forget_manifests_under(&self, _dir: &Path) {}
}

/// Filesystem-backed Node resolver.
#[derive(Debug, Clone)]
pub struct NodeResolver {
    extensions: &'static [&'static str],
    manifest_cache: Arc<dyn ManifestCache>,
    global_paths: Vec<PathBuf>,
}

impl Default for NodeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeResolver {
    /// Resolver with an in-memory manifest cache and global folders from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache(Arc::new(MemoryManifestCache::new()))
    }

    #[must_use]
    pub fn with_cache(manifest_cache: Arc<dyn ManifestCache>) -> Self {
        Self {
            extensions: CJS_EXTENSIONS,
            manifest_cache,
            global_paths: global_folders(),
        }
    }

    /// Replace the global folders searched by [`ModuleResolver::resolve_from_paths`].
    #[must_use]
    pub fn with_global_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.global_paths = paths;
        self
    }

    #[must_use]
    pub fn global_paths(&self) -> &[PathBuf] {
        &self.global_paths
    }

    fn resolve_spec(
        &self,
        parent: &Path,
        spec: &str,
        lookup: &[PathBuf],
        tried: &mut Vec<PathBuf>,
    ) -> ResolveResult {
        if spec.is_empty() {
            return ResolveResult::unresolved(ResolveReasonCode::SpecifierInvalid, tried);
        }
        if spec.contains("://") || spec.starts_with("node:") || spec.starts_with("data:") {
            return ResolveResult::unresolved(ResolveReasonCode::UnsupportedScheme, tried);
        }
        if is_relative(spec) {
            return self.resolve_path(&parent.join(spec), tried);
        }
        if Path::new(spec).is_absolute() || spec.starts_with('/') {
            return self.resolve_path(Path::new(spec), tried);
        }
        self.resolve_bare(spec, lookup, tried)
    }

    /// Load as file, then as directory.
    fn resolve_path(&self, base: &Path, tried: &mut Vec<PathBuf>) -> ResolveResult {
        add_tried(tried, base);
        if base.is_file() {
            return ResolveResult::resolved(finish(base), tried);
        }

        for ext in self.extensions {
            let candidate = append_extension(base, ext);
            add_tried(tried, &candidate);
            if candidate.is_file() {
                return ResolveResult::resolved(finish(&candidate), tried);
            }
        }

        if base.is_dir() {
            return self.resolve_dir(base, tried);
        }

        ResolveResult::unresolved(ResolveReasonCode::NotFound, tried)
    }

    /// `main` (as file or directory index), then `index.*`.
    fn resolve_dir(&self, dir: &Path, tried: &mut Vec<PathBuf>) -> ResolveResult {
        let pkg_json_path = dir.join("package.json");
        if let Some(main) = self
            .read_pkg_json(&pkg_json_path)
            .and_then(|pkg| pkg.get("main").and_then(Value::as_str).map(str::to_string))
        {
            let main_path = optdeps_util::path::resolve(dir, &main);
            add_tried(tried, &main_path);
            if main_path.is_file() {
                return ResolveResult::resolved(finish(&main_path), tried);
            }
            for ext in self.extensions {
                let candidate = append_extension(&main_path, ext);
                add_tried(tried, &candidate);
                if candidate.is_file() {
                    return ResolveResult::resolved(finish(&candidate), tried);
                }
            }
            if let Some(index) = self.find_index(&main_path, tried) {
                return ResolveResult::resolved(index, tried);
            }
        }

        if let Some(index) = self.find_index(dir, tried) {
            return ResolveResult::resolved(index, tried);
        }

        if dir.is_dir() {
            ResolveResult::unresolved(ResolveReasonCode::IsDirectory, tried)
        } else {
            ResolveResult::unresolved(ResolveReasonCode::NotFound, tried)
        }
    }

    fn find_index(&self, dir: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
        self.extensions.iter().find_map(|ext| {
            let index = dir.join(format!("index{ext}"));
            add_tried(tried, &index);
            index.is_file().then(|| finish(&index))
        })
    }

    /// Walk the lookup directories for `<dir>/<package>`.
    fn resolve_bare(&self, spec: &str, lookup: &[PathBuf], tried: &mut Vec<PathBuf>) -> ResolveResult {
        let (pkg_name, subpath) = parse_bare_specifier(spec);
        let mut found_lookup_dir = false;
        let mut specific_error = None;

        for dir in lookup {
            if !dir.is_dir() {
                continue;
            }
            found_lookup_dir = true;

            let pkg_dir = dir.join(pkg_name);
            add_tried(tried, &pkg_dir);
            if !pkg_dir.is_dir() {
                continue;
            }

            let result = match subpath {
                Some(sub) => self.resolve_package_subpath(&pkg_dir, sub, tried),
                None => self.resolve_package_root(&pkg_dir, tried),
            };
            if result.is_resolved() {
                return result;
            }
            if let Some(
                reason @ (ResolveReasonCode::ExportsTargetNotFound
                | ResolveReasonCode::ExportsNotFound),
            ) = result.reason
            {
                specific_error = Some(reason);
            }
        }

        if let Some(reason) = specific_error {
            return ResolveResult::unresolved(reason, tried);
        }
        if found_lookup_dir {
            ResolveResult::unresolved(ResolveReasonCode::NotFound, tried)
        } else {
            ResolveResult::unresolved(ResolveReasonCode::NodeModulesNotFound, tried)
        }
    }

    /// Package root: `exports` when present, otherwise file/directory loading.
    fn resolve_package_root(&self, pkg_dir: &Path, tried: &mut Vec<PathBuf>) -> ResolveResult {
        let pkg_json_path = pkg_dir.join("package.json");
        if let Some(pkg) = self.read_pkg_json(&pkg_json_path) {
            if pkg.get("exports").is_some() {
                add_tried(tried, &pkg_json_path);
                return match exports_root(&pkg, REQUIRE_CONDITIONS) {
                    Some(target) => self.exports_target(pkg_dir, &target, tried),
                    None => ResolveResult::unresolved(ResolveReasonCode::ExportsNotFound, tried),
                };
            }
        }
        self.resolve_path(pkg_dir, tried)
    }

    fn resolve_package_subpath(
        &self,
        pkg_dir: &Path,
        subpath: &str,
        tried: &mut Vec<PathBuf>,
    ) -> ResolveResult {
        let pkg_json_path = pkg_dir.join("package.json");
        if let Some(pkg) = self.read_pkg_json(&pkg_json_path) {
            if pkg.get("exports").is_some() {
                add_tried(tried, &pkg_json_path);
                let key = format!("./{subpath}");
                return match exports_subpath(&pkg, &key, REQUIRE_CONDITIONS) {
                    Some(target) => self.exports_target(pkg_dir, &target, tried),
                    None => ResolveResult::unresolved(ResolveReasonCode::ExportsNotFound, tried),
                };
            }
        }
        self.resolve_path(&pkg_dir.join(subpath), tried)
    }

    /// Export targets are exact; no extension probing.
    fn exports_target(&self, pkg_dir: &Path, target: &str, tried: &mut Vec<PathBuf>) -> ResolveResult {
        let target_path = optdeps_util::path::resolve(pkg_dir, target);
        add_tried(tried, &target_path);
        if target_path.is_file() {
            ResolveResult::resolved(finish(&target_path), tried)
        } else {
            ResolveResult::unresolved(ResolveReasonCode::ExportsTargetNotFound, tried)
        }
    }

    /// Resolve `pkg_name[/subpath]` through the `exports` of the nearest
    /// enclosing package when its name matches.
    fn resolve_self_reference(&self, base: &Path, spec: &str, tried: &mut Vec<PathBuf>) -> Option<ResolveResult> {
        let (pkg_name, subpath) = parse_bare_specifier(spec);
        let (pkg_dir, pkg) = base.ancestors().find_map(|dir| {
            let pkg = self.read_pkg_json(&dir.join("package.json"))?;
            Some((dir, pkg))
        })?;

        if pkg.get("name").and_then(Value::as_str) != Some(pkg_name) || pkg.get("exports").is_none() {
            return None;
        }

        let target = match subpath {
            Some(sub) => exports_subpath(&pkg, &format!("./{sub}"), REQUIRE_CONDITIONS),
            None => exports_root(&pkg, REQUIRE_CONDITIONS),
        }?;
        let result = self.exports_target(pkg_dir, &target, tried);
        result.is_resolved().then_some(result)
    }

    fn read_pkg_json(&self, path: &Path) -> Option<Value> {
        if let Some(value) = self.manifest_cache.lookup(path) {
            return Some(value);
        }
        if !path.is_file() {
            return None;
        }
        let text = optdeps_util::fs::read_manifest_text(path).ok()?;
        let value: Value = serde_json::from_str(&text).ok()?;
        self.manifest_cache.store(path, value.clone());
        Some(value)
    }
}

impl ModuleResolver for NodeResolver {
    fn resolve_from(&self, base: &Path, specifier: &str) -> ResolveResult {
        let mut tried = Vec::new();
        if is_bare(specifier) {
            if let Some(result) = self.resolve_self_reference(base, specifier, &mut tried) {
                return result;
            }
        }
        let lookup = node_modules_paths(base);
        self.resolve_spec(base, specifier, &lookup, &mut tried)
    }

    fn resolve_from_paths(&self, paths: &[PathBuf], specifier: &str) -> ResolveResult {
        let mut tried = Vec::new();

        if !is_bare(specifier) {
            for base in paths {
                let result = self.resolve_spec(base, specifier, &[], &mut tried);
                if result.is_resolved() {
                    return result;
                }
            }
            return ResolveResult::unresolved(ResolveReasonCode::NotFound, &tried);
        }

        let mut lookup: Vec<PathBuf> = Vec::new();
        for dir in paths
            .iter()
            .flat_map(|base| node_modules_paths(base))
            .chain(self.global_paths.iter().cloned())
        {
            if !lookup.contains(&dir) {
                lookup.push(dir);
            }
        }
        self.resolve_bare(specifier, &lookup, &mut tried)
    }

    fn resolve_directory(&self, dir: &Path) -> ResolveResult {
        let mut tried = Vec::new();
        if dir.is_file() {
            return ResolveResult::resolved(finish(dir), &tried);
        }
        self.resolve_dir(dir, &mut tried)
    }

    fn read_package_json(&self, path: &Path) -> Option<Value> {
        self.read_pkg_json(path)
    }

    fn forget_manifests_under(&self, dir: &Path) {
        self.manifest_cache.invalidate_under(dir);
    }
}

/// Global module folders: `NODE_PATH` entries, then `~/.node_modules` and
/// `~/.node_libraries`.
#[must_use]
pub fn global_folders() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::env::var_os(NODE_PATH_ENV)
        .map(|v| {
            std::env::split_paths(&v)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();

    if let Some(home) = dirs_next::home_dir() {
        dirs.push(home.join(".node_modules"));
        dirs.push(home.join(".node_libraries"));
    }
    dirs
}

/// `node_modules` directories from `start` up to the filesystem root,
/// skipping `node_modules/node_modules`.
#[must_use]
pub fn node_modules_paths(start: &Path) -> Vec<PathBuf> {
    start
        .ancestors()
        .filter(|dir| dir.file_name().map_or(true, |name| name != "node_modules"))
        .map(|dir| dir.join("node_modules"))
        .collect()
}

/// Split a bare specifier into package name and optional subpath.
///
/// `lodash/fp` -> (`lodash`, `fp`), `@scope/pkg/sub` -> (`@scope/pkg`, `sub`).
#[must_use]
pub fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    let name_end = if spec.starts_with('@') {
        spec.match_indices('/').nth(1).map(|(i, _)| i)
    } else {
        spec.find('/')
    };

    match name_end {
        Some(i) => (&spec[..i], Some(&spec[i + 1..]).filter(|s| !s.is_empty())),
        None => (spec, None),
    }
}

fn is_relative(spec: &str) -> bool {
    spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../")
}

fn is_bare(spec: &str) -> bool {
    !spec.is_empty()
        && !is_relative(spec)
        && !Path::new(spec).is_absolute()
        && !spec.starts_with('/')
        && !spec.contains("://")
        && !spec.starts_with("node:")
}

/// `foo.min` + `.js` -> `foo.min.js` (append, never replace).
fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(ext);
    PathBuf::from(name)
}

/// Realpath the result so symlinked store layouts report their real location.
fn finish(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn add_tried(tried: &mut Vec<PathBuf>, path: &Path) {
    if tried.len() < MAX_TRIED_PATHS {
        tried.push(path.to_path_buf());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    fn write_package(root: &Path, name: &str, manifest: &str, files: &[(&str, &str)]) -> PathBuf {
        let dir = optdeps_util::path::node_modules_package_dir(root, name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("package.json"), manifest).unwrap();
        for (rel, body) in files {
            let path = dir.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }
        dir
    }

    fn resolver() -> NodeResolver {
        NodeResolver::new().with_global_paths(Vec::new())
    }

    #[test]
    fn test_bare_walks_up_from_nested_base() {
        let dir = tempdir().unwrap();
        write_package(
            dir.path(),
            "lodash",
            r#"{"name": "lodash", "main": "lodash.js"}"#,
            &[("lodash.js", "module.exports = _")],
        );
        let nested = dir.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        let result = resolver().resolve_from(&nested, "lodash");
        assert!(result.is_resolved());
        assert!(result.resolved.unwrap().ends_with("lodash.js"));
    }

    #[test]
    fn test_scoped_package_exports_require() {
        let dir = tempdir().unwrap();
        write_package(
            dir.path(),
            "@scope/loader",
            r#"{"name": "@scope/loader", "exports": {".": {"import": "./esm.mjs", "require": "./cjs.cjs"}}}"#,
            &[("esm.mjs", ""), ("cjs.cjs", "")],
        );

        let result = resolver().resolve_from(dir.path(), "@scope/loader");
        assert!(result.resolved.unwrap().ends_with("cjs.cjs"));
    }

    #[test]
    fn test_exports_target_missing() {
        let dir = tempdir().unwrap();
        write_package(
            dir.path(),
            "broken",
            r#"{"name": "broken", "exports": "./dist/index.js", "main": "index.js"}"#,
            &[("index.js", "")],
        );

        let result = resolver().resolve_from(dir.path(), "broken");
        assert_eq!(result.reason, Some(ResolveReasonCode::ExportsTargetNotFound));
    }

    #[test]
    fn test_subpath_via_exports_pattern() {
        let dir = tempdir().unwrap();
        write_package(
            dir.path(),
            "react-dom",
            r#"{"name": "react-dom", "exports": {".": "./index.js", "./*": "./*.js"}}"#,
            &[("index.js", ""), ("client.js", "")],
        );

        let result = resolver().resolve_from(dir.path(), "react-dom/client");
        assert!(result.resolved.unwrap().ends_with("client.js"));
    }

    #[test]
    fn test_subpath_without_exports_tries_extensions() {
        let dir = tempdir().unwrap();
        write_package(
            dir.path(),
            "lodash",
            r#"{"name": "lodash"}"#,
            &[("fp.min.js", "")],
        );

        let result = resolver().resolve_from(dir.path(), "lodash/fp.min");
        assert!(result.resolved.unwrap().ends_with("fp.min.js"));
    }

    #[test]
    fn test_directory_ignores_exports() {
        let dir = tempdir().unwrap();
        let pkg_dir = write_package(
            dir.path(),
            "exports-only",
            r#"{"name": "exports-only", "exports": {".": {"require": "./lib/entry.cjs"}}}"#,
            &[("lib/entry.cjs", "")],
        );

        let result = resolver().resolve_directory(&pkg_dir);
        assert_eq!(result.reason, Some(ResolveReasonCode::IsDirectory));
    }

    #[test]
    fn test_directory_main_then_index() {
        let dir = tempdir().unwrap();
        let pkg_dir = write_package(
            dir.path(),
            "with-main",
            r#"{"name": "with-main", "main": "./lib"}"#,
            &[("lib/index.js", "")],
        );

        let result = resolver().resolve_directory(&pkg_dir);
        assert!(result.resolved.unwrap().ends_with(Path::new("lib").join("index.js")));
    }

    #[test]
    fn test_self_reference() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "my-tool", "exports": {"./plugin": "./src/plugin.js"}}"#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src").join("plugin.js"), "").unwrap();

        let result = resolver().resolve_from(dir.path(), "my-tool/plugin");
        assert!(result.resolved.unwrap().ends_with("plugin.js"));
    }

    #[test]
    fn test_resolve_from_paths_uses_global_folders() {
        let project = tempdir().unwrap();
        let global = tempdir().unwrap();
        let pkg_dir = global.path().join("less-loader");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(pkg_dir.join("index.js"), "").unwrap();

        let resolver = NodeResolver::new().with_global_paths(vec![global.path().to_path_buf()]);

        assert!(!resolver.resolve_from(project.path(), "less-loader").is_resolved());
        let result = resolver.resolve_from_paths(&[project.path().to_path_buf()], "less-loader");
        assert!(result.resolved.unwrap().ends_with("index.js"));
    }

    #[test]
    fn test_unsupported_scheme_and_empty() {
        let dir = tempdir().unwrap();
        let r = resolver();
        assert_eq!(
            r.resolve_from(dir.path(), "node:fs").reason,
            Some(ResolveReasonCode::UnsupportedScheme)
        );
        assert_eq!(
            r.resolve_from(dir.path(), "").reason,
            Some(ResolveReasonCode::SpecifierInvalid)
        );
    }

    #[test]
    fn test_parse_bare_specifier() {
        assert_eq!(parse_bare_specifier("lodash"), ("lodash", None));
        assert_eq!(parse_bare_specifier("lodash/fp"), ("lodash", Some("fp")));
        assert_eq!(parse_bare_specifier("@scope/pkg"), ("@scope/pkg", None));
        assert_eq!(parse_bare_specifier("@scope/pkg/a/b"), ("@scope/pkg", Some("a/b")));
    }

    #[test]
    fn test_node_modules_paths_skip_nested() {
        let paths = node_modules_paths(Path::new("/a/node_modules/b"));
        assert_eq!(paths[0], PathBuf::from("/a/node_modules/b/node_modules"));
        assert_eq!(paths[1], PathBuf::from("/a/node_modules"));
        assert!(!paths.contains(&PathBuf::from("/a/node_modules/node_modules")));
    }

    #[test]
    fn test_forget_manifests_rereads_main() {
        let root = tempdir().unwrap();
        let dir = write_package(
            root.path(),
            "vue-loader",
            r#"{"main": "a.js"}"#,
            &[("a.js", ""), ("b.js", "")],
        );
        let r = resolver();
        let first = r.resolve_from(root.path(), "vue-loader").into_path().unwrap();
        assert!(first.ends_with("a.js"));

        // Same length, so only an explicit forget guarantees a re-read.
        fs::write(dir.join("package.json"), r#"{"main": "b.js"}"#).unwrap();
        r.forget_manifests_under(root.path());
        let second = r.resolve_from(root.path(), "vue-loader").into_path().unwrap();
        assert!(second.ends_with("b.js"));
    }

    #[test]
    #[serial]
    fn test_node_path_feeds_multi_path_search() {
        let global = tempdir().unwrap();
        let project = tempdir().unwrap();
        write_package(global.path(), "less-loader", r#"{"main": "dist/cjs.js"}"#, &[("dist/cjs.js", "")]);

        std::env::set_var(NODE_PATH_ENV, global.path().join("node_modules"));
        let folders = global_folders();
        std::env::remove_var(NODE_PATH_ENV);
        assert_eq!(folders[0], global.path().join("node_modules"));

        let r = NodeResolver::new().with_global_paths(folders);
        assert!(!r.resolve_from(project.path(), "less-loader").is_resolved());
        let hit = r
            .resolve_from_paths(&[project.path().to_path_buf()], "less-loader")
            .into_path()
            .unwrap();
        assert!(hit.ends_with("cjs.js"));
    }
}
