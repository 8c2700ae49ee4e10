//! Build metadata (name and full version) written before a build and read after it.
//!
//! # Design
//! - The metadata file is the only channel between the pre-build stamp and the post-build run.
//! - Both the camelCase keys and the host serializer's underscore-prefixed keys are accepted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};

/// Timestamp layout appended to the bundle version: `yyyy.MMdd.HHmm`.
const VERSION_STAMP_FORMAT: &str = "%Y.%m%d.%H%M";

/// Name and version of the build being standardized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    /// Human-facing build name; also used to rename executables and bundles.
    #[serde(rename = "buildName", alias = "_buildName")]
    pub build_name: String,
    /// Bundle version followed by the UTC build stamp.
    #[serde(rename = "fullVersion", alias = "_fullVersion")]
    pub full_version: String,
}

impl BuildMetadata {
    /// Metadata with an explicit full version.
    #[must_use]
    pub fn new(build_name: impl Into<String>, full_version: impl Into<String>) -> Self {
        Self {
            build_name: build_name.into(),
            full_version: full_version.into(),
        }
    }

    /// Metadata whose full version is `bundle_version` stamped with `built_at`.
    #[must_use]
    pub fn stamp(
        build_name: impl Into<String>,
        bundle_version: &str,
        built_at: DateTime<Utc>,
    ) -> Self {
        Self::new(build_name, stamp_full_version(bundle_version, built_at))
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.build_name.trim().is_empty() {
            return Err(ConfigError::invalid(
                "build_name",
                "empty",
                Some(self.build_name.clone()),
            ));
        }
        if self.full_version.trim().is_empty() {
            return Err(ConfigError::invalid(
                "full_version",
                "empty",
                Some(self.full_version.clone()),
            ));
        }
        Ok(())
    }
}

/// Compose `"{bundle_version}-{yyyy.MMdd.HHmm}"` from a UTC timestamp.
#[must_use]
pub fn stamp_full_version(bundle_version: &str, built_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}",
        bundle_version.trim(),
        built_at.format(VERSION_STAMP_FORMAT)
    )
}

/// Append a CI build number to a bundle version (`"1.2."` + `"45"` is `"1.2.45"`).
///
/// A blank build number leaves the version unchanged.
#[must_use]
pub fn append_build_number(bundle_version: &str, build_number: Option<&str>) -> String {
    let version = bundle_version.trim();
    match build_number.map(str::trim).filter(|number| !number.is_empty()) {
        Some(number) => format!("{version}{number}"),
        None => version.to_string(),
    }
}

/// Build name taken from the name of the project folder.
///
/// # Errors
///
/// Returns an error when the folder cannot be made absolute or has no usable name.
pub fn project_folder_build_name(project_root: &Path) -> ConfigResult<String> {
    let absolute = std::path::absolute(project_root)
        .map_err(|source| ConfigError::io("metadata.project_root", project_root, source))?;
    absolute
        .components()
        .next_back()
        .and_then(|component| match component {
            std::path::Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .map(str::to_string)
        .ok_or_else(|| {
            ConfigError::invalid(
                "build_name",
                "no_project_folder_name",
                Some(absolute.to_string_lossy().into_owned()),
            )
        })
}

/// Source of build metadata for a completed build.
pub trait BuildMetadataStore: Send + Sync {
    /// Load the metadata for the current build.
    ///
    /// # Errors
    ///
    /// Returns an error when the metadata is unavailable or incomplete.
    fn load(&self) -> ConfigResult<BuildMetadata>;

    /// Discard the metadata once the build it describes is finished.
    /// Returns whether anything was removed; stores without backing state remove nothing.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing state exists but cannot be removed.
    fn clear(&self) -> ConfigResult<bool> {
        Ok(false)
    }
}

/// Metadata persisted as a JSON document.
#[derive(Debug, Clone)]
pub struct JsonMetadataStore {
    path: PathBuf,
}

impl JsonMetadataStore {
    /// Store backed by the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `metadata` to the backing document, creating parent folders.
    ///
    /// # Errors
    ///
    /// Returns an error when the metadata is incomplete or the document cannot be written.
    pub fn save(&self, metadata: &BuildMetadata) -> ConfigResult<()> {
        metadata.validate()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::io("metadata.create_dir", parent, source))?;
        }
        let body = serde_json::to_string_pretty(metadata)
            .map_err(|source| ConfigError::json("metadata.serialize", &self.path, source))?;
        fs::write(&self.path, body)
            .map_err(|source| ConfigError::io("metadata.write", &self.path, source))?;
        info!(
            path = %self.path.display(),
            build_name = %metadata.build_name,
            full_version = %metadata.full_version,
            "build metadata written"
        );
        Ok(())
    }
}

impl BuildMetadataStore for JsonMetadataStore {
    fn load(&self) -> ConfigResult<BuildMetadata> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ConfigError::MetadataMissing {
                    path: self.path.clone(),
                });
            }
            Err(err) => return Err(ConfigError::io("metadata.read", &self.path, err)),
        };
        let metadata: BuildMetadata = serde_json::from_str(&text)
            .map_err(|source| ConfigError::json("metadata.parse", &self.path, source))?;
        metadata.validate()?;
        debug!(path = %self.path.display(), build_name = %metadata.build_name, "build metadata loaded");
        Ok(metadata)
    }

    fn clear(&self) -> ConfigResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "build metadata removed");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(ConfigError::io("metadata.remove", &self.path, err)),
        }
    }
}

/// Fixed metadata, for callers that already know the build identity.
#[derive(Debug, Clone)]
pub struct StaticMetadataStore {
    metadata: BuildMetadata,
}

impl StaticMetadataStore {
    /// Store that always yields `metadata`.
    #[must_use]
    pub const fn new(metadata: BuildMetadata) -> Self {
        Self { metadata }
    }
}

impl BuildMetadataStore for StaticMetadataStore {
    fn load(&self) -> ConfigResult<BuildMetadata> {
        self.metadata.validate()?;
        Ok(self.metadata.clone())
    }
}
