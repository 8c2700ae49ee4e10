//! # Design
//!
//! - Provide structured, constant-message errors for planning and copying.
//! - Capture operation context (paths, fields, inputs) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced while planning or copying build output.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// Input validation failures (names, versions, nested destinations).
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The build output the host reported does not exist.
    #[error("build output not found")]
    SourceNotFound {
        /// Missing path.
        path: PathBuf,
    },
    /// No copy strategy handles the target's platform family.
    #[error("fsops unsupported platform")]
    Unsupported {
        /// Host name of the target.
        target: String,
    },
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Walkdir traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// One or more files could not be copied; carries the first failure in plan order.
    #[error("fsops copy failure")]
    Copy {
        /// Number of files that failed to copy.
        failures: usize,
        /// Destination of the first failed copy.
        path: PathBuf,
        /// Underlying IO error of the first failed copy.
        source: io::Error,
    },
    /// The copy worker pool could not be started.
    #[error("fsops worker pool failure")]
    ThreadPool {
        /// Underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::InvalidInput {
            field,
            reason,
            value,
        }
    }

    /// Whether the error stems from invalid input rather than the filesystem.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
