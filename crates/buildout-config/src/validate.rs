//! Validation helpers and parsing utilities for configuration values.

use std::path::{Component, Path};

use crate::error::{ConfigError, ConfigResult};
use crate::model::StandardizationConfig;

/// Characters rejected in any destination path segment.
///
/// The set is the union of characters invalid on the filesystems build output
/// is commonly shared across, so a layout produced on one host stays valid on the others.
pub const INVALID_PATH_CHARS: &[char] = &['<', '>', '"', '|', '?', '*', '\0'];

/// Returns `true` when `value` contains a character from [`INVALID_PATH_CHARS`]
/// or an ASCII control character.
#[must_use]
pub fn has_invalid_path_chars(value: &str) -> bool {
    value
        .chars()
        .any(|ch| INVALID_PATH_CHARS.contains(&ch) || ch.is_ascii_control())
}

/// Validate a loaded configuration snapshot.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the first offending field.
pub fn validate_config(config: &StandardizationConfig) -> ConfigResult<()> {
    validate_destination_root(&config.destination_root)?;

    if config.copy_threads == Some(0) {
        return Err(ConfigError::invalid(
            "copy_threads",
            "must_be_positive",
            Some("0".to_string()),
        ));
    }

    if config.log_level.trim().is_empty() {
        return Err(ConfigError::invalid(
            "log_level",
            "empty",
            Some(config.log_level.clone()),
        ));
    }

    Ok(())
}

fn validate_destination_root(root: &Path) -> ConfigResult<()> {
    let display = root.to_string_lossy();
    if display.trim().is_empty() {
        return Err(ConfigError::invalid(
            "destination_root",
            "empty",
            Some(display.into_owned()),
        ));
    }

    for component in root.components() {
        if let Component::Normal(segment) = component {
            let Some(segment) = segment.to_str() else {
                return Err(ConfigError::invalid(
                    "destination_root",
                    "non_utf8",
                    Some(display.into_owned()),
                ));
            };
            if has_invalid_path_chars(segment) {
                return Err(ConfigError::invalid(
                    "destination_root",
                    "invalid_characters",
                    Some(display.into_owned()),
                ));
            }
        }
    }

    Ok(())
}

/// Parse a boolean flag from an environment-style string.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not a recognised boolean.
pub fn parse_bool(field: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(
            field,
            "invalid_bool",
            Some(value.to_string()),
        )),
    }
}

/// Parse a positive worker count.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not a positive integer.
pub fn parse_thread_count(field: &'static str, value: &str) -> ConfigResult<usize> {
    let count = value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::invalid(field, "invalid_integer", Some(value.to_string())))?;
    if count == 0 {
        return Err(ConfigError::invalid(
            field,
            "must_be_positive",
            Some(value.to_string()),
        ));
    }
    Ok(count)
}
