//! Lexical path helpers.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by removing `.` and resolving `..` components without
/// touching the filesystem.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other),
        }
    }
    result
}

/// Join `relative` onto `base` and normalize, the way `path.resolve` does for
/// a relative entry such as `./dist/index.js`. Absolute `relative` values
/// replace `base`.
#[must_use]
pub fn resolve(base: &Path, relative: &str) -> PathBuf {
    normalize(&base.join(relative))
}

/// Directory of a package inside `root/node_modules`.
///
/// Scoped ids (`@scope/name`) become nested directories.
#[must_use]
pub fn node_modules_package_dir(root: &Path, package_id: &str) -> PathBuf {
    let mut dir = root.join("node_modules");
    for segment in package_id.split('/') {
        dir.push(segment);
    }
    dir
}
