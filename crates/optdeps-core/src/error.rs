//! Optional dependency error types.
//!
//! Messages are `[<integration>] <sentence>` followed by the pretty JSON
//! diagnostics on the next lines. Tooling matches on both halves.

use crate::diagnostics::Diagnostics;
use std::path::PathBuf;

/// Stable error codes.
pub mod codes {
    pub const OPTDEPS_INSTALL_FAILED: &str = "OPTDEPS_INSTALL_FAILED";
    pub const OPTDEPS_INSTALL_ROOT_UNAVAILABLE: &str = "OPTDEPS_INSTALL_ROOT_UNAVAILABLE";
    pub const OPTDEPS_VERIFICATION_FAILED: &str = "OPTDEPS_VERIFICATION_FAILED";
    pub const OPTDEPS_UNRESOLVED: &str = "OPTDEPS_UNRESOLVED";
    pub const OPTDEPS_LOAD_FAILED: &str = "OPTDEPS_LOAD_FAILED";
    pub const OPTDEPS_NOT_FOUND: &str = "OPTDEPS_NOT_FOUND";
}

/// Failure of a resolve, install, verify or load step.
///
/// `Clone` because every waiter on a shared install receives the same error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionalDepsError {
    /// The install primitive reported failure.
    #[error("[{}] Optional dependencies failed to install.\n{}", .diagnostics.integration, .diagnostics)]
    InstallFailed { diagnostics: Box<Diagnostics> },

    /// Install reported success but there is no install root to verify.
    #[error(
        "[{}] Optional dependency install root is unavailable.\n{}",
        .diagnostics.integration,
        .diagnostics
    )]
    InstallRootUnavailable { diagnostics: Box<Diagnostics> },

    /// Install reported success but packages are absent at the install root.
    #[error(
        "[{}] Optional dependency install reported success but packages are missing: {}.\n{}",
        .diagnostics.integration,
        .missing.join(", "),
        .diagnostics
    )]
    VerificationFailed {
        missing: Vec<String>,
        diagnostics: Box<Diagnostics>,
    },

    /// Still unresolved after a verified install.
    #[error(
        "[{}] {} could not be resolved after optional dependency installation.\n{}",
        .diagnostics.integration,
        .diagnostics.dependency_id,
        .diagnostics
    )]
    Unresolved { diagnostics: Box<Diagnostics> },

    /// Resolved, but no load attempt succeeded.
    #[error(
        "[{}] {} could not be loaded after it resolved.\n{}",
        .diagnostics.integration,
        .diagnostics.dependency_id,
        .diagnostics
    )]
    LoadFailed { diagnostics: Box<Diagnostics> },

    /// A pre-flighted dependency is not resolvable (synchronous lookup).
    #[error("[CSS] {dependency_id} could not be resolved. Searched: {}", join_paths(.searched))]
    NotFound {
        dependency_id: String,
        searched: Vec<PathBuf>,
    },
}

impl OptionalDepsError {
    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InstallFailed { .. } => codes::OPTDEPS_INSTALL_FAILED,
            Self::InstallRootUnavailable { .. } => codes::OPTDEPS_INSTALL_ROOT_UNAVAILABLE,
            Self::VerificationFailed { .. } => codes::OPTDEPS_VERIFICATION_FAILED,
            Self::Unresolved { .. } => codes::OPTDEPS_UNRESOLVED,
            Self::LoadFailed { .. } => codes::OPTDEPS_LOAD_FAILED,
            Self::NotFound { .. } => codes::OPTDEPS_NOT_FOUND,
        }
    }

    /// The diagnostics snapshot, if this failure carries one.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::InstallFailed { diagnostics }
            | Self::InstallRootUnavailable { diagnostics }
            | Self::VerificationFailed { diagnostics, .. }
            | Self::Unresolved { diagnostics }
            | Self::LoadFailed { diagnostics } => Some(diagnostics),
            Self::NotFound { .. } => None,
        }
    }

    /// Whether the install primitive or its verification failed, as opposed
    /// to resolution or loading.
    #[must_use]
    pub fn is_install_error(&self) -> bool {
        matches!(
            self,
            Self::InstallFailed { .. }
                | Self::InstallRootUnavailable { .. }
                | Self::VerificationFailed { .. }
        )
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
