//! Command handlers grouped by concern.

pub(crate) mod clean;
pub(crate) mod config;
pub(crate) mod plan;
pub(crate) mod stamp;
pub(crate) mod standardize;
