//! Configuration loading from a JSON document plus environment overrides.
//!
//! # Design
//! - Load once at process start; callers receive an owned, validated snapshot.
//! - A missing default document means defaults; a missing explicit document is an error.
//! - Relative destination roots resolve against the project root, not the working directory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::model::StandardizationConfig;
use crate::validate::{parse_bool, parse_thread_count, validate_config};

/// Environment variables recognised as configuration overrides, keyed by the
/// suffix that follows [`defaults::ENV_PREFIX`].
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    vars: BTreeMap<String, String>,
}

impl EnvOverrides {
    /// Capture every `BUILDOUT_*` variable from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Build overrides from explicit key/value pairs (full variable names).
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .filter_map(|(key, value)| {
                let key = key.into();
                key.strip_prefix(defaults::ENV_PREFIX)
                    .map(|suffix| (suffix.to_string(), value.into()))
            })
            .collect();
        Self { vars }
    }

    fn get(&self, suffix: &str) -> Option<&str> {
        self.vars
            .get(suffix)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Apply the captured overrides on top of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when an override cannot be parsed.
    pub fn apply(&self, config: &mut StandardizationConfig) -> ConfigResult<()> {
        if let Some(root) = self.get("DESTINATION_ROOT") {
            config.destination_root = PathBuf::from(root);
        }
        if let Some(value) = self.get("GROUP_BY_BUILD_NAME") {
            config.group_by_build_name = parse_bool("group_by_build_name", value)?;
        }
        if let Some(value) = self.get("GROUP_BY_BUILD_TARGET") {
            config.group_by_build_target = parse_bool("group_by_build_target", value)?;
        }
        if let Some(value) = self.get("REVEAL_AFTER_COPY") {
            config.reveal_after_copy = parse_bool("reveal_after_copy", value)?;
        }
        if let Some(value) = self.get("REVEAL_TARGET") {
            config.reveal_target = value.parse()?;
        }
        if let Some(value) = self.get("CLEAN_METADATA_AFTER_RUN") {
            config.clean_metadata_after_run = parse_bool("clean_metadata_after_run", value)?;
        }
        if let Some(value) = self.get("CREATE_STANDARDIZED_OUTPUT") {
            config.create_standardized_output = parse_bool("create_standardized_output", value)?;
        }
        if let Some(value) = self.get("COPY_THREADS") {
            config.copy_threads = Some(parse_thread_count("copy_threads", value)?);
        }
        if let Some(value) = self.get("LOG") {
            config.log_level = value.to_string();
        }
        if let Some(value) = self.get("LOG_FORMAT") {
            config.log_format = Some(value.parse()?);
        }
        Ok(())
    }

    /// Number of recognised variables captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no overrides were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Resolves a [`StandardizationConfig`] for a project.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    project_root: PathBuf,
    config_path: Option<PathBuf>,
    env: EnvOverrides,
}

impl ConfigLoader {
    /// Loader rooted at `project_root` with no environment overrides.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            config_path: None,
            env: EnvOverrides::default(),
        }
    }

    /// Use an explicit configuration document instead of `<project>/buildout.json`.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Layer the given environment overrides on top of the document.
    #[must_use]
    pub fn with_env(mut self, env: EnvOverrides) -> Self {
        self.env = env;
        self
    }

    /// Project root that relative paths resolve against.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Path of the configuration document this loader reads.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| self.project_root.join(defaults::CONFIG_FILE_NAME))
    }

    /// Read, override, resolve and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be read or parsed, when an
    /// override is malformed, or when validation fails.
    pub fn load(&self) -> ConfigResult<StandardizationConfig> {
        let path = self.config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(path = %path.display(), "reading configuration document");
                serde_json::from_str::<StandardizationConfig>(&text)
                    .map_err(|source| ConfigError::json("config.parse", &path, source))?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound && self.config_path.is_none() => {
                debug!(path = %path.display(), "no configuration document; using defaults");
                StandardizationConfig::default()
            }
            Err(err) => return Err(ConfigError::io("config.read", &path, err)),
        };

        self.env.apply(&mut config)?;

        if config.destination_root.is_relative() {
            config.destination_root = self.project_root.join(&config.destination_root);
        }

        validate_config(&config)?;

        info!(
            destination_root = %config.destination_root.display(),
            group_by_build_name = config.group_by_build_name,
            group_by_build_target = config.group_by_build_target,
            reveal_after_copy = config.reveal_after_copy,
            reveal_target = config.reveal_target.as_str(),
            overrides = self.env.len(),
            "configuration loaded"
        );

        Ok(config)
    }
}
