//! # Design
//!
//! - Resolve configuration and metadata locations from the project root once.
//! - Hand explicit dependencies to the orchestrator; nothing reads globals later.
//! - Telemetry is installed at most once per process by the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use buildout_config::defaults::METADATA_FILE_NAME;
use buildout_config::{
    BuildMetadataStore, ConfigLoader, EnvOverrides, JsonMetadataStore, LogFormatSetting,
    StandardizationConfig, project_folder_build_name,
};
use buildout_events::EventBus;
use buildout_telemetry::{LogFormat, LoggingConfig, init_logging, log_format_from_name};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::orchestrator::Orchestrator;

/// Project-scoped wiring for configuration, metadata and the orchestrator.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    project_root: PathBuf,
    config_file: Option<PathBuf>,
    metadata_file: Option<PathBuf>,
    env: EnvOverrides,
}

impl Bootstrap {
    /// Bootstrap rooted at `project_root`, reading overrides from the process environment.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            config_file: None,
            metadata_file: None,
            env: EnvOverrides::from_env(),
        }
    }

    /// Use an explicit configuration file instead of the project default.
    #[must_use]
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Use an explicit metadata file instead of the project default.
    #[must_use]
    pub fn with_metadata_file(mut self, path: Option<PathBuf>) -> Self {
        self.metadata_file = path;
        self
    }

    /// Replace the environment overrides.
    #[must_use]
    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }

    /// Project root every relative path resolves against.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Load and validate the configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be read, parsed or validated.
    pub fn load_config(&self) -> AppResult<StandardizationConfig> {
        let mut loader = ConfigLoader::new(&self.project_root).with_env(self.env.clone());
        if let Some(path) = &self.config_file {
            loader = loader.with_config_file(self.resolve(path));
        }
        loader
            .load()
            .map_err(|err| AppError::config("config.load", err))
    }

    /// Store holding the build name and version for this project.
    #[must_use]
    pub fn metadata_store(&self) -> JsonMetadataStore {
        let path = self.metadata_file.as_ref().map_or_else(
            || self.project_root.join(METADATA_FILE_NAME),
            |path| self.resolve(path),
        );
        JsonMetadataStore::new(path)
    }

    /// Build name used when none is given: the project folder's name.
    ///
    /// # Errors
    ///
    /// Returns an error when the project root has no usable folder name.
    pub fn default_build_name(&self) -> AppResult<String> {
        project_folder_build_name(&self.project_root)
            .map_err(|err| AppError::config("metadata.build_name", err))
    }

    /// Remove this project's build metadata document, if present.
    ///
    /// # Errors
    ///
    /// Returns an error when the document exists but cannot be removed.
    pub fn clear_metadata(&self) -> AppResult<bool> {
        self.metadata_store()
            .clear()
            .map_err(|err| AppError::config("metadata.clear", err))
    }

    /// Orchestrator wired to this project's metadata store.
    ///
    /// # Errors
    ///
    /// Returns an error when the copy worker pool cannot be started.
    pub fn orchestrator(
        &self,
        config: StandardizationConfig,
        events: EventBus,
    ) -> AppResult<Orchestrator> {
        let metadata = self.metadata_store();
        info!(
            project_root = %self.project_root.display(),
            metadata = %metadata.path().display(),
            destination_root = %config.destination_root.display(),
            "orchestrator wired"
        );
        Orchestrator::new(config, Arc::new(metadata), events)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Install the global tracing subscriber using the configured level and format.
///
/// # Errors
///
/// Returns an error when the level directive is malformed or a subscriber is
/// already installed.
pub fn init_telemetry(config: &StandardizationConfig) -> AppResult<()> {
    let format = log_format_from_name(config.log_format.map(LogFormatSetting::as_str))
        .unwrap_or_else(LogFormat::infer);
    let logging = LoggingConfig {
        level: &config.log_level,
        format,
        build_sha: option_env!("BUILDOUT_BUILD_SHA").unwrap_or("dev"),
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildout_config::BuildMetadata;

    #[test]
    fn metadata_store_defaults_to_project_file() {
        let bootstrap = Bootstrap::new("/projects/courier").with_env(EnvOverrides::default());
        assert_eq!(
            bootstrap.metadata_store().path(),
            Path::new("/projects/courier").join(METADATA_FILE_NAME)
        );
    }

    #[test]
    fn relative_overrides_resolve_against_project_root() {
        let bootstrap = Bootstrap::new("/projects/courier")
            .with_env(EnvOverrides::default())
            .with_metadata_file(Some(PathBuf::from("meta/build.json")));
        assert_eq!(
            bootstrap.metadata_store().path(),
            Path::new("/projects/courier/meta/build.json")
        );
    }

    #[test]
    fn missing_metadata_surfaces_from_store() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let bootstrap = Bootstrap::new(dir.path()).with_env(EnvOverrides::default());
        assert!(matches!(
            bootstrap.metadata_store().load(),
            Err(buildout_config::ConfigError::MetadataMissing { .. })
        ));
        Ok(())
    }

    #[test]
    fn default_build_name_is_project_folder() -> anyhow::Result<()> {
        let bootstrap = Bootstrap::new("/projects/Space Courier").with_env(EnvOverrides::default());
        assert_eq!(bootstrap.default_build_name()?, "Space Courier");
        Ok(())
    }

    #[test]
    fn clear_metadata_removes_stamped_document() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let bootstrap = Bootstrap::new(dir.path()).with_env(EnvOverrides::default());
        bootstrap
            .metadata_store()
            .save(&BuildMetadata::new("Courier", "1.0"))?;

        assert!(bootstrap.clear_metadata()?);
        assert!(!bootstrap.metadata_store().path().exists());
        assert!(!bootstrap.clear_metadata()?);
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_a_telemetry_error() {
        let config = StandardizationConfig {
            log_level: "buildout=loud".to_string(),
            ..StandardizationConfig::default()
        };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(
                init_telemetry(&config),
                Err(AppError::Telemetry {
                    operation: "telemetry.init",
                    ..
                })
            ));
        }
    }
}
