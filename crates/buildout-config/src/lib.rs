#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! File-backed configuration and build metadata for standardized build output.
//!
//! Layout: `model.rs` (typed configuration), `loader.rs` (file + environment
//! resolution), `validate.rs` (field validation), `metadata.rs` (build name and
//! version records written before a build and read after it).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, EnvOverrides};
pub use metadata::{
    BuildMetadata, BuildMetadataStore, JsonMetadataStore, StaticMetadataStore,
    append_build_number, project_folder_build_name, stamp_full_version,
};
pub use model::{LogFormatSetting, RevealTarget, StandardizationConfig};
