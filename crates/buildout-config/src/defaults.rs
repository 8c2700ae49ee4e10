//! Default values shared by the loader and the CLI.
//!
//! # Design
//! - Keep file names and fallbacks in one place so every surface agrees on them.

/// Folder, relative to the project root, that receives standardized output.
pub const DESTINATION_ROOT: &str = "Builds";
/// Configuration file looked up in the project root when no path is given.
pub const CONFIG_FILE_NAME: &str = "buildout.json";
/// Metadata file written by `stamp` and read after the build.
pub const METADATA_FILE_NAME: &str = "buildout.metadata.json";
/// Log level used when neither the file nor the environment provide one.
pub const LOG_LEVEL: &str = "info";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "BUILDOUT_";
