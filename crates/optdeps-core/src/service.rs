//! The optional dependency service.
//!
//! [`OptionalDeps`] owns one install registry, so every caller sharing a
//! service instance shares single-flight installs. Tests build their own
//! instance for isolation.

use crate::bases::{BaseCalculator, InstallRootProvider};
use crate::config::OptionalDepsConfig;
use crate::diagnostics::Diagnostics;
use crate::error::OptionalDepsError;
use crate::install::{missing_packages, InstallKey, InstallOutcome, InstallRegistry, Installer};
use crate::load::{load_first, ModuleLoader};
use crate::locate::{Locator, ResolutionResult};
use crate::request::DependencyRequest;
use crate::resolver::{ModuleResolver, NodeResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolve, install, verify and load optional dependencies.
#[derive(Debug, Clone)]
pub struct OptionalDeps {
    locator: Locator,
    installer: Arc<dyn Installer>,
    registry: InstallRegistry,
}

impl OptionalDeps {
    /// Service backed by a [`NodeResolver`].
    #[must_use]
    pub fn new(
        installer: Arc<dyn Installer>,
        provider: Arc<dyn InstallRootProvider>,
        config: OptionalDepsConfig,
    ) -> Self {
        Self::with_resolver(installer, provider, config, Arc::new(NodeResolver::new()))
    }

    #[must_use]
    pub fn with_resolver(
        installer: Arc<dyn Installer>,
        provider: Arc<dyn InstallRootProvider>,
        config: OptionalDepsConfig,
        resolver: Arc<dyn ModuleResolver>,
    ) -> Self {
        let strategies = config.strategies.clone();
        let bases = BaseCalculator::new(provider, config);
        Self {
            locator: Locator::new(bases, resolver, strategies),
            installer,
            registry: InstallRegistry::new(),
        }
    }

    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    #[must_use]
    pub fn registry(&self) -> &InstallRegistry {
        &self.registry
    }

    /// Current install root from the provider.
    #[must_use]
    pub fn install_root(&self) -> Option<PathBuf> {
        self.locator.bases().install_root()
    }

    /// Resolution bases for `project_path`, recomputed on every call.
    #[must_use]
    pub fn resolution_bases(&self, project_path: &Path) -> Vec<PathBuf> {
        self.locator.bases().compute(project_path)
    }

    /// Resolve the dependency, installing and verifying it first if needed.
    pub async fn ensure_package_resolved(
        &self,
        request: &DependencyRequest,
    ) -> Result<PathBuf, OptionalDepsError> {
        let install_root = self.install_root();

        if let Some(hit) = self.locate(request, install_root.as_deref()) {
            return Ok(hit.resolved_path);
        }

        debug!(
            integration = %request.integration,
            dependency = %request.dependency_id,
            "dependency not resolvable, installing"
        );
        self.ensure_installed(request).await?;
        if let Some(root) = &install_root {
            self.locator.resolver().forget_manifests_under(root);
        }

        if let Some(hit) = self.locate(request, install_root.as_deref()) {
            return Ok(hit.resolved_path);
        }

        let diagnostics =
            Diagnostics::build(request, self.locator.bases(), install_root.as_deref()).await;
        Err(OptionalDepsError::Unresolved {
            diagnostics: Box::new(diagnostics),
        })
    }

    /// Install and verify the request's packages, joining any pending
    /// install for the same install root and package set.
    pub async fn ensure_installed(&self, request: &DependencyRequest) -> InstallOutcome {
        let install_root = self.install_root();
        let key = InstallKey::new(install_root.as_deref(), &request.install_dependencies());

        let installer = Arc::clone(&self.installer);
        let bases = self.locator.bases().clone();
        let request = request.clone();
        self.registry
            .run(key, move || install_and_verify(installer, bases, request, install_root))
            .await
    }

    /// Resolve, then load the module through `loader`.
    pub async fn ensure_module_loaded<L>(
        &self,
        request: &DependencyRequest,
        loader: &L,
    ) -> Result<L::Module, OptionalDepsError>
    where
        L: ModuleLoader + ?Sized,
    {
        self.ensure_module_loaded_with(request, loader, |module| module)
            .await
    }

    /// Resolve, load, then apply `adapter` to the loaded module.
    pub async fn ensure_module_loaded_with<L, T, F>(
        &self,
        request: &DependencyRequest,
        loader: &L,
        adapter: F,
    ) -> Result<T, OptionalDepsError>
    where
        L: ModuleLoader + ?Sized,
        F: FnOnce(L::Module) -> T,
    {
        let resolved_path = self.ensure_package_resolved(request).await?;
        let install_root = self.install_root();
        let bases = self
            .locator
            .bases()
            .compute_with_root(&request.project_path, install_root.as_deref());

        let load_error = match load_first(loader, &bases, &request.dependency_id, &resolved_path) {
            Ok(module) => return Ok(adapter(module)),
            Err(e) => e.to_string(),
        };

        warn!(
            integration = %request.integration,
            dependency = %request.dependency_id,
            error = %load_error,
            "module resolved but could not be loaded"
        );
        let diagnostics = Diagnostics::build(request, self.locator.bases(), install_root.as_deref())
            .await
            .with_load_failure(resolved_path, load_error);
        Err(OptionalDepsError::LoadFailed {
            diagnostics: Box::new(diagnostics),
        })
    }

    /// Resolve a dependency that an earlier step already installed.
    ///
    /// Never installs; fails immediately listing the searched bases.
    pub fn resolve_sync(
        &self,
        dependency_id: &str,
        project_path: &Path,
    ) -> Result<PathBuf, OptionalDepsError> {
        let install_root = self.install_root();
        let bases = self
            .locator
            .bases()
            .compute_with_root(project_path, install_root.as_deref());

        self.locator
            .locate_in(dependency_id, project_path, &bases, install_root.as_deref())
            .map(|hit| hit.resolved_path)
            .ok_or_else(|| OptionalDepsError::NotFound {
                dependency_id: dependency_id.to_string(),
                searched: bases,
            })
    }

    fn locate(&self, request: &DependencyRequest, install_root: Option<&Path>) -> Option<ResolutionResult> {
        self.locator
            .locate(&request.dependency_id, &request.project_path, install_root)
    }
}

async fn install_and_verify(
    installer: Arc<dyn Installer>,
    bases: BaseCalculator,
    request: DependencyRequest,
    install_root: Option<PathBuf>,
) -> InstallOutcome {
    let packages = request.install_dependencies();

    if !installer.install(&request.integration, &packages).await {
        warn!(
            integration = %request.integration,
            packages = %packages.join(", "),
            "optional dependency install failed"
        );
        let diagnostics = Diagnostics::build(&request, &bases, install_root.as_deref()).await;
        return Err(OptionalDepsError::InstallFailed {
            diagnostics: Box::new(diagnostics),
        });
    }

    let Some(root) = install_root.as_deref() else {
        let diagnostics = Diagnostics::build(&request, &bases, None).await;
        return Err(OptionalDepsError::InstallRootUnavailable {
            diagnostics: Box::new(diagnostics),
        });
    };

    let missing = missing_packages(&request.verify_package_ids(), root).await;
    if !missing.is_empty() {
        let diagnostics = Diagnostics::build(&request, &bases, Some(root)).await;
        return Err(OptionalDepsError::VerificationFailed {
            missing,
            diagnostics: Box::new(diagnostics),
        });
    }

    info!(
        integration = %request.integration,
        packages = %packages.join(", "),
        root = %root.display(),
        "optional dependencies installed and verified"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bases::{FixedInstallRoot, NoInstallRoot};
    use crate::error::codes;
    use crate::load::{LoadedModule, LoaderError, ModuleKind, SourceLoader};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    /// Counts calls; optionally lays out each package under `root`.
    #[derive(Debug)]
    struct MockInstaller {
        calls: AtomicUsize,
        root: Option<PathBuf>,
        succeed: bool,
        write_packages: bool,
        write_entry: bool,
    }

    impl MockInstaller {
        fn writing(root: &Path) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                root: Some(root.to_path_buf()),
                succeed: true,
                write_packages: true,
                write_entry: true,
            }
        }

        fn reporting(succeed: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                root: None,
                succeed,
                write_packages: false,
                write_entry: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Installer for MockInstaller {
        async fn install(&self, _integration: &str, packages: &[String]) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;

            if let (true, Some(root)) = (self.write_packages, &self.root) {
                for id in packages {
                    let dir = optdeps_util::path::node_modules_package_dir(root, id);
                    fs::create_dir_all(&dir).unwrap();
                    if self.write_entry {
                        fs::write(dir.join("package.json"), format!(r#"{{"name": "{id}", "main": "index.js"}}"#))
                            .unwrap();
                        fs::write(dir.join("index.js"), "module.exports = {}").unwrap();
                    } else {
                        fs::write(dir.join("package.json"), format!(r#"{{"name": "{id}"}}"#)).unwrap();
                    }
                }
            }
            self.succeed
        }
    }

    struct Fixture {
        project: TempDir,
        root: TempDir,
        cwd: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                project: tempdir().unwrap(),
                root: tempdir().unwrap(),
                cwd: tempdir().unwrap(),
            }
        }

        fn service(&self, installer: Arc<MockInstaller>, provider: Arc<dyn InstallRootProvider>) -> OptionalDeps {
            OptionalDeps::with_resolver(
                installer,
                provider,
                OptionalDepsConfig::new().with_cwd(self.cwd.path()),
                Arc::new(NodeResolver::new().with_global_paths(Vec::new())),
            )
        }

        fn fixed_root(&self) -> Arc<dyn InstallRootProvider> {
            Arc::new(FixedInstallRoot::new(self.root.path()))
        }

        fn request(&self, dependency_id: &str) -> DependencyRequest {
            DependencyRequest::new("React", self.project.path(), dependency_id)
        }
    }

    fn canonical(path: PathBuf) -> PathBuf {
        dunce::canonicalize(path).unwrap()
    }

    #[tokio::test]
    async fn test_present_dependency_never_installs() {
        let fx = Fixture::new();
        let pkg = fx.project.path().join("node_modules").join("react-refresh");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{"main": "runtime.js"}"#).unwrap();
        fs::write(pkg.join("runtime.js"), "").unwrap();

        let installer = Arc::new(MockInstaller::reporting(false));
        let service = fx.service(Arc::clone(&installer), fx.fixed_root());

        for _ in 0..3 {
            let path = service
                .ensure_package_resolved(&fx.request("react-refresh"))
                .await
                .unwrap();
            assert_eq!(path, canonical(pkg.join("runtime.js")));
        }
        assert_eq!(installer.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_install_once() {
        let fx = Fixture::new();
        let installer = Arc::new(MockInstaller::writing(fx.root.path()));
        let service = fx.service(Arc::clone(&installer), fx.fixed_root());
        let request = fx.request("@scope/react-refresh");

        let results = futures::future::join_all((0..5).map(|_| service.ensure_package_resolved(&request))).await;

        let expected = canonical(
            fx.root
                .path()
                .join("node_modules")
                .join("@scope")
                .join("react-refresh")
                .join("index.js"),
        );
        for result in results {
            assert_eq!(result.unwrap(), expected);
        }
        assert_eq!(installer.calls(), 1);
        assert_eq!(service.registry().in_flight(), 0);

        // Already installed: no further installs.
        let again = service.ensure_package_resolved(&request).await.unwrap();
        assert_eq!(again, expected);
        assert_eq!(installer.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_install_is_retried_by_next_call() {
        let fx = Fixture::new();
        let installer = Arc::new(MockInstaller::reporting(false));
        let service = fx.service(Arc::clone(&installer), fx.fixed_root());
        let request = fx.request("react-refresh");

        let first = service.ensure_package_resolved(&request).await.unwrap_err();
        assert_eq!(first.code(), codes::OPTDEPS_INSTALL_FAILED);
        assert!(first.to_string().starts_with("[React] Optional dependencies failed to install.\n"));

        let second = service.ensure_package_resolved(&request).await.unwrap_err();
        assert_eq!(second.code(), codes::OPTDEPS_INSTALL_FAILED);
        assert_eq!(installer.calls(), 2);
    }

    #[tokio::test]
    async fn test_reported_success_without_packages_fails_verification() {
        let fx = Fixture::new();
        let installer = Arc::new(MockInstaller::reporting(true));
        let service = fx.service(Arc::clone(&installer), fx.fixed_root());
        let request = fx
            .request("@scope/missing-loader")
            .with_install_dependencies(["@scope/missing-loader", "helper"]);

        let err = service.ensure_package_resolved(&request).await.unwrap_err();
        assert_eq!(err.code(), codes::OPTDEPS_VERIFICATION_FAILED);
        let message = err.to_string();
        assert!(message.contains("packages are missing"));
        assert!(message.contains("@scope/missing-loader, helper."));

        let diagnostics = err.diagnostics().unwrap();
        assert_eq!(diagnostics.install_root.as_deref(), Some(fx.root.path()));
        assert!(diagnostics.verify_state.iter().all(|s| !s.exists_at_install_root));
    }

    #[tokio::test]
    async fn test_install_without_root_is_unavailable() {
        let fx = Fixture::new();
        let installer = Arc::new(MockInstaller::reporting(true));
        let service = fx.service(Arc::clone(&installer), Arc::new(NoInstallRoot));

        let err = service
            .ensure_package_resolved(&fx.request("react-refresh"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::OPTDEPS_INSTALL_ROOT_UNAVAILABLE);
        assert!(err.diagnostics().unwrap().install_root.is_none());
    }

    #[tokio::test]
    async fn test_verified_but_unresolvable() {
        let fx = Fixture::new();
        let mut installer = MockInstaller::writing(fx.root.path());
        installer.write_entry = false;
        let installer = Arc::new(installer);
        let service = fx.service(Arc::clone(&installer), fx.fixed_root());

        let err = service
            .ensure_package_resolved(&fx.request("react-refresh"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::OPTDEPS_UNRESOLVED);
        assert!(err
            .to_string()
            .starts_with("[React] react-refresh could not be resolved after optional dependency installation."));
    }

    #[tokio::test]
    async fn test_exports_require_resolves_after_install() {
        let fx = Fixture::new();
        let pkg = fx.root.path().join("node_modules").join("vue-loader");
        fs::create_dir_all(pkg.join("dist")).unwrap();
        fs::write(
            pkg.join("package.json"),
            r#"{"exports": {".": {"require": "./dist/index.cjs"}}}"#,
        )
        .unwrap();
        fs::write(pkg.join("dist").join("index.cjs"), "").unwrap();

        let installer = Arc::new(MockInstaller::reporting(false));
        let service = fx.service(Arc::clone(&installer), fx.fixed_root());

        let path = service
            .ensure_package_resolved(&fx.request("vue-loader"))
            .await
            .unwrap();
        assert_eq!(canonical(path), canonical(pkg.join("dist").join("index.cjs")));
        assert_eq!(installer.calls(), 0);
    }

    #[tokio::test]
    async fn test_module_loaded_and_adapted() {
        let fx = Fixture::new();
        let installer = Arc::new(MockInstaller::writing(fx.root.path()));
        let service = fx.service(Arc::clone(&installer), fx.fixed_root());
        let loader = SourceLoader::new(Arc::new(NodeResolver::new().with_global_paths(Vec::new())));

        let module: LoadedModule = service
            .ensure_module_loaded(&fx.request("less-loader"), &loader)
            .await
            .unwrap();
        assert_eq!(module.kind, ModuleKind::CommonJs);

        let len = service
            .ensure_module_loaded_with(&fx.request("less-loader"), &loader, |m| m.source.len())
            .await
            .unwrap();
        assert_eq!(len, "module.exports = {}".len());
        assert_eq!(installer.calls(), 1);
    }

    #[derive(Debug)]
    struct FailingLoader;

    impl ModuleLoader for FailingLoader {
        type Module = ();

        fn load_from(&self, base: &Path, specifier: &str) -> Result<(), LoaderError> {
            Err(LoaderError::NotResolvable {
                specifier: specifier.to_string(),
                base: base.to_path_buf(),
            })
        }

        fn load_path(&self, path: &Path) -> Result<(), LoaderError> {
            Err(LoaderError::Io {
                path: path.to_path_buf(),
                message: "permission denied".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_load_failure_carries_last_error() {
        let fx = Fixture::new();
        let installer = Arc::new(MockInstaller::writing(fx.root.path()));
        let service = fx.service(Arc::clone(&installer), fx.fixed_root());

        let err = service
            .ensure_module_loaded(&fx.request("react-refresh"), &FailingLoader)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::OPTDEPS_LOAD_FAILED);
        assert!(err
            .to_string()
            .starts_with("[React] react-refresh could not be loaded after it resolved.\n"));

        let diagnostics = err.diagnostics().unwrap();
        assert!(diagnostics.resolved_path.is_some());
        assert!(diagnostics
            .load_error
            .as_deref()
            .unwrap()
            .contains("permission denied"));
    }

    #[test]
    fn test_resolve_sync_lists_bases() {
        let fx = Fixture::new();
        let service = fx.service(Arc::new(MockInstaller::reporting(true)), fx.fixed_root());

        let err = service
            .resolve_sync("less-loader", fx.project.path())
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("[CSS] less-loader could not be resolved. Searched: "));
        assert!(message.contains(&fx.root.path().display().to_string()));
        assert_eq!(err.code(), codes::OPTDEPS_NOT_FOUND);
    }

    #[test]
    fn test_bases_deduplicated_when_project_is_cwd() {
        let fx = Fixture::new();
        let service = OptionalDeps::new(
            Arc::new(MockInstaller::reporting(true)),
            Arc::new(NoInstallRoot),
            OptionalDepsConfig::new().with_cwd(fx.project.path()),
        );
        let bases = service.resolution_bases(fx.project.path());
        assert_eq!(bases, vec![fx.project.path().to_path_buf()]);
    }
}
