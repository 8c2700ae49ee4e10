//! Destination reset and the parallel copy executor.
//!
//! # Design
//! - Planning happens before any write, so a bad source leaves previous output intact.
//! - The destination reset completes before the fan-out starts.
//! - Copy tasks share no mutable state; failures are collected and the first,
//!   in plan order, is reported with the total count.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, info, warn};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{BuildDescriptor, CopyEntry, CopyPlan, CopyReport};
use crate::strategy::StrategyRegistry;

/// Platform-aware copy engine backed by a dedicated worker pool.
pub struct FileCopier {
    registry: StrategyRegistry,
    pool: ThreadPool,
}

impl FileCopier {
    /// Copier with the default strategies. `threads` of `None` uses one worker per CPU.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::ThreadPool`] when the worker pool cannot be started.
    pub fn new(threads: Option<usize>) -> FsOpsResult<Self> {
        Self::with_registry(StrategyRegistry::with_defaults(), threads)
    }

    /// Copier with a caller-supplied strategy registry.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::ThreadPool`] when the worker pool cannot be started.
    pub fn with_registry(registry: StrategyRegistry, threads: Option<usize>) -> FsOpsResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .thread_name(|index| format!("buildout-copy-{index}"))
            .build()
            .map_err(|source| FsOpsError::ThreadPool { source })?;
        Ok(Self { registry, pool })
    }

    /// Strategies this copier dispatches to.
    #[must_use]
    pub const fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Number of copy workers.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Compute the copy plan for `descriptor` into `base` without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Unsupported`] when no strategy handles the target,
    /// [`FsOpsError::SourceNotFound`] when the build output is missing, and
    /// [`FsOpsError::InvalidInput`] when source and destination overlap.
    pub fn plan(&self, descriptor: &BuildDescriptor, base: &Path) -> FsOpsResult<CopyPlan> {
        let target = descriptor.target();
        let strategy = target
            .family()
            .and_then(|family| self.registry.get(family))
            .ok_or_else(|| FsOpsError::Unsupported {
                target: target.to_string(),
            })?;

        let source = descriptor.source_output_path();
        if !source.exists() {
            return Err(FsOpsError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        let plan = strategy.plan(descriptor, base)?;
        ensure_disjoint(plan.source_root(), plan.destination())?;
        debug!(
            target = %target,
            family = strategy.family().as_str(),
            files = plan.len(),
            excluded = plan.excluded().len(),
            destination = %plan.destination().display(),
            "copy plan computed"
        );
        Ok(plan)
    }

    /// Copy every entry of `plan` in parallel.
    ///
    /// Failed files are logged and counted; copies already in flight are allowed
    /// to finish. Files written before a failure are left in place.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Copy`] describing the first failure in plan order.
    pub fn execute(&self, plan: &CopyPlan) -> FsOpsResult<CopyReport> {
        let results: Vec<io::Result<u64>> = self
            .pool
            .install(|| plan.entries().par_iter().map(copy_entry).collect());

        let mut files_copied = 0_u64;
        let mut bytes_copied = 0_u64;
        let mut failures = 0_usize;
        let mut first_failure: Option<(PathBuf, io::Error)> = None;

        for (entry, result) in plan.entries().iter().zip(results) {
            match result {
                Ok(bytes) => {
                    files_copied += 1;
                    bytes_copied += bytes;
                }
                Err(err) => {
                    warn!(
                        source = %entry.source.display(),
                        destination = %entry.destination.display(),
                        error = %err,
                        "file copy failed"
                    );
                    failures += 1;
                    if first_failure.is_none() {
                        first_failure = Some((entry.destination.clone(), err));
                    }
                }
            }
        }

        if let Some((path, source)) = first_failure {
            error!(
                failures,
                files_copied,
                destination = %plan.destination().display(),
                "copy finished with failures"
            );
            return Err(FsOpsError::Copy {
                failures,
                path,
                source,
            });
        }

        info!(
            files_copied,
            bytes_copied,
            destination = %plan.destination().display(),
            "copy completed"
        );
        Ok(CopyReport {
            files_copied,
            bytes_copied,
            destination: plan.destination().to_path_buf(),
        })
    }

    /// Plan, reset `base`, then copy.
    ///
    /// # Errors
    ///
    /// Returns any planning, reset or copy failure.
    pub fn copy(&self, descriptor: &BuildDescriptor, base: &Path) -> FsOpsResult<CopyReport> {
        let plan = self.plan(descriptor, base)?;
        reset_destination(base)?;
        self.execute(&plan)
    }
}

impl fmt::Debug for FileCopier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCopier")
            .field("registry", &self.registry)
            .field("threads", &self.threads())
            .finish()
    }
}

/// Delete `base` and everything below it, then recreate it empty.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] (`unwritable`) when permission is
/// denied, and [`FsOpsError::Io`] for other removal or creation failures.
pub fn reset_destination(base: &Path) -> FsOpsResult<()> {
    match fs::symlink_metadata(base) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(base).map_err(|source| reset_error("reset.remove_dir", base, source))?;
            debug!(path = %base.display(), "removed previous standardized output");
        }
        Ok(_) => {
            fs::remove_file(base).map_err(|source| reset_error("reset.remove_file", base, source))?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(reset_error("reset.stat", base, err)),
    }
    fs::create_dir_all(base).map_err(|source| reset_error("reset.create_dir", base, source))
}

fn reset_error(operation: &'static str, base: &Path, source: io::Error) -> FsOpsError {
    if source.kind() == io::ErrorKind::PermissionDenied {
        warn!(operation, path = %base.display(), error = %source, "destination is not writable");
        FsOpsError::invalid(
            "destination_root",
            "unwritable",
            Some(base.to_string_lossy().into_owned()),
        )
    } else {
        FsOpsError::io(operation, base, source)
    }
}

fn copy_entry(entry: &CopyEntry) -> io::Result<u64> {
    if let Some(parent) = entry.destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&entry.source, &entry.destination)
}

fn ensure_disjoint(source_root: &Path, destination: &Path) -> FsOpsResult<()> {
    let source = std::path::absolute(source_root)
        .map_err(|err| FsOpsError::io("plan.absolute_source", source_root, err))?;
    let target = std::path::absolute(destination)
        .map_err(|err| FsOpsError::io("plan.absolute_destination", destination, err))?;

    if target.starts_with(&source) {
        return Err(FsOpsError::invalid(
            "destination_root",
            "inside_source",
            Some(target.to_string_lossy().into_owned()),
        ));
    }
    if source.starts_with(&target) {
        return Err(FsOpsError::invalid(
            "destination_root",
            "contains_source",
            Some(target.to_string_lossy().into_owned()),
        ));
    }
    Ok(())
}
