//! # Design
//!
//! - Centralize application-level errors for bootstrap and orchestration.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

use crate::orchestrator::BuildResult;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration or metadata operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: buildout_config::ConfigError,
    },
    /// Planning or copying build output failed.
    #[error("filesystem operation failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: buildout_fsops::FsOpsError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: buildout_telemetry::TelemetryError,
    },
    /// The build did not succeed, so no output was standardized.
    #[error("build did not succeed")]
    BuildNotSucceeded {
        /// Result the host reported.
        result: BuildResult,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: buildout_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: buildout_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: buildout_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    /// Operation tag carried by the error.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Config { operation, .. }
            | Self::FsOps { operation, .. }
            | Self::Telemetry { operation, .. } => *operation,
            Self::BuildNotSucceeded { .. } => "build",
        }
    }

    /// Whether the error was caused by invalid configuration or input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        match self {
            Self::Config { source, .. } => {
                matches!(source, buildout_config::ConfigError::InvalidField { .. })
            }
            Self::FsOps { source, .. } => source.is_validation(),
            Self::Telemetry { .. } | Self::BuildNotSucceeded { .. } => false,
        }
    }
}
