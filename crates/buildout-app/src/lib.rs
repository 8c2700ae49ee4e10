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

//! Post-build standardization wiring.
//!
//! Layout: `bootstrap.rs` (configuration, telemetry and dependency wiring),
//! `orchestrator.rs` (per-build state machine), `reveal.rs` (host file browser).

/// Configuration loading and dependency wiring.
pub mod bootstrap;
/// Application error types.
pub mod error;
/// Post-build state machine.
pub mod orchestrator;
/// Opening the destination in the host file browser.
pub mod reveal;

pub use bootstrap::{Bootstrap, init_telemetry};
pub use error::{AppError, AppResult};
pub use orchestrator::{
    BuildCompletionEvent, BuildResult, Orchestrator, RunOutcome, SkipReason, StandardizedOutput,
};
pub use reveal::{NoopRevealer, Revealer, SystemRevealer};
