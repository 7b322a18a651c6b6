//! Post-install verification.
//!
//! Verification inspects the install root only, never the other resolution
//! bases: installs always target one location.

use std::path::Path;
use tracing::debug;

/// Whether `<install_root>/node_modules/<package_id>/package.json` exists.
pub async fn verify_exists(package_id: &str, install_root: &Path) -> bool {
    let manifest =
        optdeps_util::path::node_modules_package_dir(install_root, package_id).join("package.json");
    tokio::fs::try_exists(&manifest).await.unwrap_or(false)
}

/// The subset of `package_ids` absent at `install_root`, in input order.
pub async fn missing_packages(package_ids: &[String], install_root: &Path) -> Vec<String> {
    let mut missing = Vec::new();
    for id in package_ids {
        if !verify_exists(id, install_root).await {
            missing.push(id.clone());
        }
    }
    debug!(
        root = %install_root.display(),
        checked = package_ids.len(),
        missing = missing.len(),
        "verified install root"
    );
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_verify_requires_manifest() {
        let root = tempdir().unwrap();
        let dir = root.path().join("node_modules").join("@prefresh").join("core");
        fs::create_dir_all(&dir).unwrap();
        assert!(!verify_exists("@prefresh/core", root.path()).await);

        fs::write(dir.join("package.json"), "{}").unwrap();
        assert!(verify_exists("@prefresh/core", root.path()).await);
    }

    #[tokio::test]
    async fn test_missing_packages_keeps_order() {
        let root = tempdir().unwrap();
        let present = root.path().join("node_modules").join("preact");
        fs::create_dir_all(&present).unwrap();
        fs::write(present.join("package.json"), "{}").unwrap();

        let ids = vec![
            "@prefresh/utils".to_string(),
            "preact".to_string(),
            "@prefresh/core".to_string(),
        ];
        assert_eq!(
            missing_packages(&ids, root.path()).await,
            vec!["@prefresh/utils", "@prefresh/core"]
        );
    }
}
