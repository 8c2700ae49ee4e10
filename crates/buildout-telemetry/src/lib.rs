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

//! Logging setup shared by the buildout binaries.

pub mod error;
pub mod init;

pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging, log_format_from_name,
};
