//! Single-flight install registry.
//!
//! At most one install runs per [`InstallKey`]. Callers that arrive while it
//! is pending await the same shared future and observe the same outcome. The
//! entry is removed when the future settles, so the next call after a
//! failure starts a fresh install.

use crate::error::OptionalDepsError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Key component used when no install root is known.
pub const MISSING_INSTALL_ROOT: &str = "missing-install-root";

/// Outcome shared by every waiter of one install.
pub type InstallOutcome = Result<(), OptionalDepsError>;

type SharedInstall = Shared<BoxFuture<'static, InstallOutcome>>;

/// `<install root>::<sorted packages joined by ::>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstallKey(String);

impl InstallKey {
    #[must_use]
    pub fn new(install_root: Option<&Path>, packages: &[String]) -> Self {
        let mut sorted: Vec<&str> = packages.iter().map(String::as_str).collect();
        sorted.sort_unstable();

        let root = install_root.map_or_else(
            || MISSING_INSTALL_ROOT.to_string(),
            |r| r.display().to_string(),
        );

        let mut parts = Vec::with_capacity(sorted.len() + 1);
        parts.push(root.as_str());
        parts.extend(sorted);
        Self(parts.join("::"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of pending installs. Clones share the same map.
#[derive(Clone, Default)]
pub struct InstallRegistry {
    in_flight: Arc<Mutex<HashMap<InstallKey, SharedInstall>>>,
}

impl fmt::Debug for InstallRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallRegistry")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl InstallRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of installs currently pending.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_in_flight(&self, key: &InstallKey) -> bool {
        self.lock().contains_key(key)
    }

    /// Join the pending install for `key`, or start one with `start`.
    ///
    /// `start` is only called when no install is pending. The entry is
    /// registered before anything is awaited.
    ///
    /// The install only makes progress while some caller polls it. If every
    /// caller is dropped first, the entry stays registered (so
    /// [`in_flight`](Self::in_flight) is non-zero with nothing running) until
    /// the next caller for the same key joins and drives it to completion.
    pub async fn run<F, Fut>(&self, key: InstallKey, start: F) -> InstallOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = InstallOutcome> + Send + 'static,
    {
        let shared = {
            let mut in_flight = self.lock();
            if let Some(existing) = in_flight.get(&key) {
                debug!(key = %key, "joining in-flight install");
                existing.clone()
            } else {
                debug!(key = %key, "starting install");
                let registry = self.clone();
                let entry_key = key.clone();
                let install = start();
                let shared = async move {
                    let outcome = install.await;
                    registry.lock().remove(&entry_key);
                    outcome
                }
                .boxed()
                .shared();
                in_flight.insert(key, shared.clone());
                shared
            }
        };

        shared.await
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<InstallKey, SharedInstall>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
