//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers; resolution against the project root lives in `loader.rs`.
//! - The snapshot is read-only once loaded and is passed into the orchestrator explicitly.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;

/// User-configured options for standardized build output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StandardizationConfig {
    /// Root folder that receives standardized output.
    pub destination_root: PathBuf,
    /// Place output inside a folder named after the build.
    pub group_by_build_name: bool,
    /// Place output inside a folder named after the build target.
    pub group_by_build_target: bool,
    /// Open a folder in the file browser once the run finishes.
    pub reveal_after_copy: bool,
    /// Which folder to open when revealing.
    pub reveal_target: RevealTarget,
    /// Delete the build metadata document once a run finishes, whatever its outcome.
    pub clean_metadata_after_run: bool,
    /// Master switch; when off, completed builds are left untouched.
    pub create_standardized_output: bool,
    /// Size of the copy worker pool. `None` uses one worker per CPU.
    pub copy_threads: Option<usize>,
    /// Log level directive handed to the tracing subscriber.
    pub log_level: String,
    /// Log output format; inferred from the build profile when unset.
    pub log_format: Option<LogFormatSetting>,
}

impl Default for StandardizationConfig {
    fn default() -> Self {
        Self {
            destination_root: PathBuf::from(defaults::DESTINATION_ROOT),
            group_by_build_name: false,
            group_by_build_target: true,
            reveal_after_copy: true,
            reveal_target: RevealTarget::Standardized,
            clean_metadata_after_run: false,
            create_standardized_output: true,
            copy_threads: None,
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: None,
        }
    }
}

/// Folder shown in the file browser after a run.
///
/// When a run is skipped there is no standardized folder, so the original
/// build output is shown for every choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealTarget {
    /// The folder the host built into.
    Original,
    /// The standardized copy.
    #[default]
    Standardized,
    /// Both folders.
    Both,
}

impl RevealTarget {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Standardized => "standardized",
            Self::Both => "both",
        }
    }

    /// Whether the build's own output folder is shown.
    #[must_use]
    pub const fn includes_original(self) -> bool {
        matches!(self, Self::Original | Self::Both)
    }

    /// Whether the standardized folder is shown.
    #[must_use]
    pub const fn includes_standardized(self) -> bool {
        matches!(self, Self::Standardized | Self::Both)
    }
}

impl FromStr for RevealTarget {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "standardized" => Ok(Self::Standardized),
            "both" => Ok(Self::Both),
            _ => Err(ConfigError::invalid(
                "reveal_target",
                "unknown_target",
                Some(value.to_string()),
            )),
        }
    }
}

/// Log format selection as written in configuration documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Human-readable output.
    Pretty,
    /// Structured JSON output.
    Json,
}

impl LogFormatSetting {
    /// Render the format as its lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl FromStr for LogFormatSetting {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::invalid(
                "log_format",
                "unknown_format",
                Some(value.to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_group_by_target_only() {
        let config = StandardizationConfig::default();
        assert_eq!(config.destination_root, PathBuf::from("Builds"));
        assert!(!config.group_by_build_name);
        assert!(config.group_by_build_target);
        assert!(config.reveal_after_copy);
        assert!(config.create_standardized_output);
        assert_eq!(config.copy_threads, None);
        assert_eq!(config.reveal_target, RevealTarget::Standardized);
        assert!(!config.clean_metadata_after_run);
    }

    #[test]
    fn reveal_target_parses_and_selects_folders() {
        assert_eq!("Both".parse::<RevealTarget>().ok(), Some(RevealTarget::Both));
        assert!("desktop".parse::<RevealTarget>().is_err());
        assert!(RevealTarget::Original.includes_original());
        assert!(!RevealTarget::Original.includes_standardized());
        assert!(RevealTarget::Both.includes_original() && RevealTarget::Both.includes_standardized());
        let config: StandardizationConfig =
            serde_json::from_str(r#"{"reveal_target": "original"}"#).expect("valid document");
        assert_eq!(config.reveal_target, RevealTarget::Original);
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config: StandardizationConfig =
            serde_json::from_str(r#"{"group_by_build_name": true}"#).expect("valid document");
        assert!(config.group_by_build_name);
        assert!(config.group_by_build_target);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = serde_json::from_str::<StandardizationConfig>(r#"{"group_by_name": true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!(
            "JSON".parse::<LogFormatSetting>().ok(),
            Some(LogFormatSetting::Json)
        );
        assert_eq!(
            " pretty ".parse::<LogFormatSetting>().ok(),
            Some(LogFormatSetting::Pretty)
        );
        assert!("yaml".parse::<LogFormatSetting>().is_err());
        assert_eq!(LogFormatSetting::Json.as_str(), "json");
    }
}
