//! Destination layout for standardized output.
//!
//! The layout is `root[/build_name][/target]/"{build_name} ({target}) v{full_version}"`.
//! Planning is pure and never touches the filesystem.

use std::path::PathBuf;

use buildout_config::StandardizationConfig;
use buildout_config::validate::has_invalid_path_chars;

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::BuildDescriptor;

/// Compute the folder that receives the standardized copy of `descriptor`.
#[must_use]
pub fn plan_destination(descriptor: &BuildDescriptor, config: &StandardizationConfig) -> PathBuf {
    let mut path = config.destination_root.clone();
    if config.group_by_build_name {
        path.push(descriptor.build_name());
    }
    if config.group_by_build_target {
        path.push(descriptor.target().as_str());
    }
    path.push(leaf_name(descriptor));
    path
}

/// Name of the innermost destination folder.
#[must_use]
pub fn leaf_name(descriptor: &BuildDescriptor) -> String {
    format!(
        "{} ({}) v{}",
        descriptor.build_name(),
        descriptor.target(),
        descriptor.full_version()
    )
}

/// Reject values that cannot be used as a single folder or file name.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] naming `field` and the reason.
pub fn validate_segment(field: &'static str, value: &str) -> FsOpsResult<()> {
    let reason = if value.trim().is_empty() {
        Some("empty")
    } else if value.contains(['/', '\\']) {
        Some("path_separator")
    } else if value.contains("..") {
        Some("parent_reference")
    } else if value.contains(':') || has_invalid_path_chars(value) {
        Some("invalid_characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(FsOpsError::invalid(field, reason, Some(value.to_string()))),
        None => Ok(()),
    }
}

/// Validate every descriptor value that becomes part of a path.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] for the first invalid value.
pub fn validate_descriptor(descriptor: &BuildDescriptor) -> FsOpsResult<()> {
    validate_segment("build_name", descriptor.build_name())?;
    validate_segment("full_version", descriptor.full_version())?;
    validate_segment("target", descriptor.target().as_str())
}
