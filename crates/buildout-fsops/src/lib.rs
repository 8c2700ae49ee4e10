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

//! Destination planning and platform-aware copying of completed builds.
//!
//! Layout: `model.rs` (targets, descriptors, plans), `planner.rs` (destination
//! layout), `strategy.rs` (per-platform copy plans and their registry),
//! `copier.rs` (destination reset and the parallel copy executor).

pub mod copier;
pub mod error;
pub mod model;
pub mod planner;
pub mod strategy;

pub use copier::{FileCopier, reset_destination};
pub use error::{FsOpsError, FsOpsResult};
pub use model::{BuildDescriptor, BuildTarget, CopyEntry, CopyPlan, CopyReport, PlatformFamily};
pub use planner::{leaf_name, plan_destination, validate_descriptor, validate_segment};
pub use strategy::{
    AndroidStrategy, CopyStrategy, DesktopStrategy, MacOsStrategy, StrategyRegistry,
    WebGlStrategy, XcodeStrategy,
};
