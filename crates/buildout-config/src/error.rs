//! Error types for configuration operations.
//!
//! # Design
//! - Constant messages; the offending field, value and path travel as context.
//! - Source errors are preserved rather than formatted into the message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// Build metadata has not been written for the current build.
    #[error("build metadata missing")]
    MetadataMissing {
        /// Location where the metadata file was expected.
        path: PathBuf,
    },
    /// Reading or writing a configuration document failed.
    #[error("configuration io failure")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Parsing or serialising a configuration document failed.
    #[error("configuration json failure")]
    Json {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source JSON error.
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        field: &'static str,
        reason: &'static str,
        value: impl Into<Option<String>>,
    ) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: value.into(),
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_helpers_build_variants() {
        let invalid = ConfigError::invalid("copy_threads", "zero", Some("0".to_string()));
        assert!(matches!(
            invalid,
            ConfigError::InvalidField {
                field: "copy_threads",
                reason: "zero",
                ..
            }
        ));
        assert_eq!(invalid.to_string(), "invalid configuration field");

        let io_err = ConfigError::io("read", "buildout.json", io::Error::other("io"));
        assert!(io_err.source().is_some());

        let json_err = ConfigError::json(
            "parse",
            "buildout.json",
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        );
        assert!(json_err.source().is_some());
    }
}
