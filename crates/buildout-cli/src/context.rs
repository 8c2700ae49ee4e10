//! Shared project context and error mapping for command handlers.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use buildout_app::{AppError, Bootstrap};
use buildout_config::{ConfigError, StandardizationConfig};
use buildout_fsops::FsOpsError;

/// CLI error distinguishing bad input from runtime failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<AppError> for CliError {
    fn from(err: AppError) -> Self {
        if err.is_validation() {
            let detail = invalid_detail(&err);
            Self::Validation(format!("{:#}: {detail}", anyhow::Error::from(err)))
        } else {
            Self::Failure(err.into())
        }
    }
}

fn invalid_detail(err: &AppError) -> String {
    let (field, reason, value) = match err {
        AppError::Config {
            source: ConfigError::InvalidField {
                field,
                reason,
                value,
            },
            ..
        }
        | AppError::FsOps {
            source:
                FsOpsError::InvalidInput {
                    field,
                    reason,
                    value,
                },
            ..
        } => (*field, *reason, value.as_deref()),
        _ => return err.operation().to_string(),
    };
    value.map_or_else(
        || format!("{field} ({reason})"),
        |value| format!("{field} ({reason}): {value:?}"),
    )
}

/// Project locations resolved from global flags.
#[derive(Debug, Clone)]
pub(crate) struct ProjectContext {
    pub(crate) bootstrap: Bootstrap,
}

impl ProjectContext {
    pub(crate) fn new(
        project_root: PathBuf,
        config: Option<PathBuf>,
        metadata: Option<PathBuf>,
    ) -> Self {
        Self {
            bootstrap: Bootstrap::new(project_root)
                .with_config_file(config)
                .with_metadata_file(metadata),
        }
    }

    pub(crate) fn load_config(&self) -> CliResult<StandardizationConfig> {
        self.bootstrap.load_config().map_err(CliError::from)
    }
}
