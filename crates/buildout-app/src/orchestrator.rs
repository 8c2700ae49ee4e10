//! Post-build orchestrator: turns a completed build into standardized output.
//!
//! # Design
//! - One run per completed build; every state transition is logged and published.
//! - Planning finishes before anything is deleted, so a bad source or name keeps
//!   the previous standardized output.
//! - Revealing is best effort and never fails a run. Skipped runs show the
//!   build's own output instead of the standardized folder.
//! - Metadata cleanup, when enabled, runs after every outcome.

use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use buildout_config::{BuildMetadataStore, StandardizationConfig};
use buildout_events::{Event, EventBus, RunState};
use buildout_fsops::{
    BuildDescriptor, BuildTarget, CopyReport, FileCopier, plan_destination, reset_destination,
    validate_descriptor,
};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::reveal::{Revealer, SystemRevealer};

/// Outcome the host reported for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildResult {
    /// The build finished and produced output.
    Succeeded,
    /// The build failed.
    Failed,
    /// The build was cancelled.
    Cancelled,
    /// The host did not report an outcome.
    Unknown,
}

impl BuildResult {
    /// Whether the build produced output worth standardizing.
    #[must_use]
    pub const fn succeeded(self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed build as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCompletionEvent {
    /// Build outcome.
    pub result: BuildResult,
    /// Target the build was made for.
    pub target: BuildTarget,
    /// Output location the host wrote to.
    pub output_path: PathBuf,
}

/// Why a run produced no output without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No copy strategy exists for the target.
    UnsupportedPlatform,
    /// Standardized output is switched off in configuration.
    Disabled,
}

impl SkipReason {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedPlatform => "unsupported_platform",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standardized output produced by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardizedOutput {
    /// Run identifier, shared with the published events.
    pub run_id: Uuid,
    /// Folder holding the standardized copy.
    pub destination: PathBuf,
    /// Copy totals.
    pub report: CopyReport,
    /// Whether every folder selected for revealing was handed to the file browser.
    pub revealed: bool,
}

/// Result of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Output was copied into place.
    Standardized(StandardizedOutput),
    /// Nothing was done for this build.
    Skipped {
        /// Target of the skipped build.
        target: BuildTarget,
        /// Why the build was skipped.
        reason: SkipReason,
        /// Whether the original build output was handed to the file browser.
        revealed: bool,
    },
}

/// Sequences planning, cleanup, copying and reveal for completed builds.
pub struct Orchestrator {
    config: StandardizationConfig,
    metadata: Arc<dyn BuildMetadataStore>,
    copier: FileCopier,
    revealer: Arc<dyn Revealer>,
    events: EventBus,
}

impl Orchestrator {
    /// Orchestrator with the default copy strategies and the system file browser.
    ///
    /// # Errors
    ///
    /// Returns an error when the copy worker pool cannot be started.
    pub fn new(
        config: StandardizationConfig,
        metadata: Arc<dyn BuildMetadataStore>,
        events: EventBus,
    ) -> AppResult<Self> {
        let copier = FileCopier::new(config.copy_threads)
            .map_err(|err| AppError::fsops("copier.new", err))?;
        Ok(Self {
            config,
            metadata,
            copier,
            revealer: Arc::new(SystemRevealer),
            events,
        })
    }

    /// Replace the revealer.
    #[must_use]
    pub fn with_revealer(mut self, revealer: Arc<dyn Revealer>) -> Self {
        self.revealer = revealer;
        self
    }

    /// Replace the copier, for custom strategies or pool sizes.
    #[must_use]
    pub fn with_copier(mut self, copier: FileCopier) -> Self {
        self.copier = copier;
        self
    }

    /// Configuration snapshot the orchestrator runs with.
    #[must_use]
    pub const fn config(&self) -> &StandardizationConfig {
        &self.config
    }

    /// Bus the orchestrator publishes run events on.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Destination folder a successful build of `target` would be copied into.
    ///
    /// # Errors
    ///
    /// Returns an error when the metadata cannot be loaded or yields invalid names.
    pub fn destination_for(&self, target: &BuildTarget) -> AppResult<PathBuf> {
        let descriptor = self.describe(target.clone(), PathBuf::new())?;
        Ok(plan_destination(&descriptor, &self.config))
    }

    /// Standardize the output of a completed build.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::BuildNotSucceeded`] for builds that did not succeed,
    /// and the failing step's error otherwise. The run's events end with
    /// `RunFailed` in both cases.
    pub fn run(&self, build: BuildCompletionEvent) -> AppResult<RunOutcome> {
        let mut run = RunContext::new(&self.events);
        let span = info_span!("standardize", run_id = %run.run_id, target = %build.target);
        let _guard = span.enter();

        let outcome = self.standardize(&mut run, &build);
        if self.config.clean_metadata_after_run {
            self.clean_metadata();
        }
        outcome
    }

    fn standardize(
        &self,
        run: &mut RunContext<'_>,
        build: &BuildCompletionEvent,
    ) -> AppResult<RunOutcome> {
        info!(
            result = build.result.as_str(),
            output_path = %build.output_path.display(),
            "build completed"
        );
        self.events.publish(Event::RunStarted {
            run_id: run.run_id,
            target: build.target.to_string(),
            output_path: build.output_path.display().to_string(),
        });
        run.enter(RunState::Idle);

        if !build.result.succeeded() {
            match build.result {
                BuildResult::Cancelled => info!("build cancelled; no standardized output"),
                _ => error!(result = build.result.as_str(), "build did not succeed"),
            }
            let err = AppError::BuildNotSucceeded {
                result: build.result,
            };
            run.fail(&err);
            return Err(err);
        }

        if !self.config.create_standardized_output {
            return Ok(self.skip(run, build, SkipReason::Disabled));
        }
        let supported = build
            .target
            .family()
            .is_some_and(|family| self.copier.registry().get(family).is_some());
        if !supported {
            return Ok(self.skip(run, build, SkipReason::UnsupportedPlatform));
        }

        let (destination, plan) = run.step(RunState::Planning, || {
            let descriptor = self.describe(build.target.clone(), build.output_path.clone())?;
            let destination = plan_destination(&descriptor, &self.config);
            let plan = self
                .copier
                .plan(&descriptor, &destination)
                .map_err(|err| AppError::fsops("copier.plan", err))?;
            Ok((destination, plan))
        })?;

        run.step(RunState::Cleaning, || {
            reset_destination(&destination).map_err(|err| AppError::fsops("copier.reset", err))
        })?;

        let report = run.step(RunState::Copying, || {
            self.copier
                .execute(&plan)
                .map_err(|err| AppError::fsops("copier.execute", err))
        })?;

        run.enter(RunState::Done);
        info!(
            destination = %destination.display(),
            files_copied = report.files_copied,
            bytes_copied = report.bytes_copied,
            "standardized build output created"
        );

        let revealed =
            self.config.reveal_after_copy && self.reveal(run, &build.output_path, &destination);

        self.events.publish(Event::RunCompleted {
            run_id: run.run_id,
            destination: destination.display().to_string(),
            files_copied: report.files_copied,
            bytes_copied: report.bytes_copied,
        });

        Ok(RunOutcome::Standardized(StandardizedOutput {
            run_id: run.run_id,
            destination,
            report,
            revealed,
        }))
    }

    fn describe(&self, target: BuildTarget, output_path: PathBuf) -> AppResult<BuildDescriptor> {
        let metadata = self
            .metadata
            .load()
            .map_err(|err| AppError::config("metadata.load", err))?;
        let descriptor =
            BuildDescriptor::new(target, output_path, metadata.build_name, metadata.full_version);
        validate_descriptor(&descriptor).map_err(|err| AppError::fsops("planner.validate", err))?;
        Ok(descriptor)
    }

    fn skip(
        &self,
        run: &mut RunContext<'_>,
        build: &BuildCompletionEvent,
        reason: SkipReason,
    ) -> RunOutcome {
        let revealed = self.config.reveal_after_copy
            && self.reveal_folder(&original_folder(&build.output_path), "original");
        run.skip(build.target.clone(), reason, revealed)
    }

    fn reveal(&self, run: &mut RunContext<'_>, original: &Path, destination: &Path) -> bool {
        run.enter(RunState::Revealing);
        let target = self.config.reveal_target;
        let mut revealed = true;
        if target.includes_original() {
            revealed &= self.reveal_folder(&original_folder(original), "original");
        }
        if target.includes_standardized() {
            revealed &= self.reveal_folder(destination, "standardized");
        }
        revealed
    }

    fn reveal_folder(&self, folder: &Path, kind: &'static str) -> bool {
        match self.revealer.reveal(folder) {
            Ok(()) => {
                debug!(kind, folder = %folder.display(), "output revealed");
                true
            }
            Err(err) => {
                warn!(
                    kind,
                    error = %err,
                    folder = %folder.display(),
                    "failed to open output folder"
                );
                false
            }
        }
    }

    fn clean_metadata(&self) {
        match self.metadata.clear() {
            Ok(removed) => debug!(removed, "build metadata cleanup finished"),
            Err(err) => warn!(error = %error_chain(&err), "failed to remove build metadata"),
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("copier", &self.copier)
            .finish_non_exhaustive()
    }
}

/// Per-run state tracking and event emission.
struct RunContext<'a> {
    run_id: Uuid,
    state: RunState,
    events: &'a EventBus,
}

impl<'a> RunContext<'a> {
    fn new(events: &'a EventBus) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::Idle,
            events,
        }
    }

    fn enter(&mut self, state: RunState) {
        info!(from = self.state.as_str(), to = state.as_str(), "run state changed");
        self.state = state;
        self.events.publish(Event::StateChanged {
            run_id: self.run_id,
            state,
        });
    }

    fn step<T, F>(&mut self, state: RunState, op: F) -> AppResult<T>
    where
        F: FnOnce() -> AppResult<T>,
    {
        self.enter(state);
        op().inspect_err(|err| self.fail(err))
    }

    fn fail(&mut self, err: &AppError) {
        let failed_in = self.state;
        self.enter(RunState::Failed);
        let message = error_chain(err);
        error!(
            operation = err.operation(),
            state = failed_in.as_str(),
            error = %message,
            "standardization failed"
        );
        self.events.publish(Event::RunFailed {
            run_id: self.run_id,
            operation: err.operation().to_string(),
            message,
        });
    }

    fn skip(&mut self, target: BuildTarget, reason: SkipReason, revealed: bool) -> RunOutcome {
        info!(reason = reason.as_str(), revealed, "standardization skipped");
        self.enter(RunState::Skipped);
        self.events.publish(Event::RunSkipped {
            run_id: self.run_id,
            target: target.to_string(),
            reason: reason.as_str().to_string(),
        });
        RunOutcome::Skipped {
            target,
            reason,
            revealed,
        }
    }
}

/// Folder holding a build's own output; file outputs resolve to their parent.
fn original_folder(output_path: &Path) -> PathBuf {
    if output_path.is_file() {
        output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    } else {
        output_path.to_path_buf()
    }
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildout_config::{BuildMetadata, StaticMetadataStore};

    fn orchestrator(config: StandardizationConfig) -> Orchestrator {
        let metadata = Arc::new(StaticMetadataStore::new(BuildMetadata::new("Courier", "1.0")));
        Orchestrator::new(config, metadata, EventBus::with_capacity(64))
            .expect("orchestrator builds")
            .with_revealer(Arc::new(crate::reveal::NoopRevealer))
    }

    fn states(bus: &EventBus) -> Vec<RunState> {
        bus.snapshot()
            .into_iter()
            .filter_map(|envelope| match envelope.event {
                Event::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn build_results_map_to_success_flag() {
        assert!(BuildResult::Succeeded.succeeded());
        for result in [BuildResult::Failed, BuildResult::Cancelled, BuildResult::Unknown] {
            assert!(!result.succeeded());
        }
        assert_eq!(BuildResult::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn unsupported_targets_are_skipped() {
        let orchestrator = orchestrator(StandardizationConfig::default());
        let outcome = orchestrator
            .run(BuildCompletionEvent {
                result: BuildResult::Succeeded,
                target: BuildTarget::Other("PS5".to_string()),
                output_path: PathBuf::from("/nowhere"),
            })
            .expect("skip is not an error");
        assert_eq!(
            outcome,
            RunOutcome::Skipped {
                target: BuildTarget::Other("PS5".to_string()),
                reason: SkipReason::UnsupportedPlatform,
                revealed: true,
            }
        );
        assert_eq!(
            states(orchestrator.events()),
            vec![RunState::Idle, RunState::Skipped]
        );
    }

    #[test]
    fn disabled_output_is_skipped() {
        let orchestrator = orchestrator(StandardizationConfig {
            create_standardized_output: false,
            ..StandardizationConfig::default()
        });
        let outcome = orchestrator
            .run(BuildCompletionEvent {
                result: BuildResult::Succeeded,
                target: BuildTarget::WebGl,
                output_path: PathBuf::from("/nowhere"),
            })
            .expect("skip is not an error");
        assert!(matches!(
            outcome,
            RunOutcome::Skipped {
                reason: SkipReason::Disabled,
                ..
            }
        ));
    }

    #[test]
    fn file_outputs_reveal_their_folder() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let exe = dir.path().join("Game.exe");
        std::fs::write(&exe, b"MZ")?;
        assert_eq!(original_folder(&exe), dir.path());
        assert_eq!(original_folder(dir.path()), dir.path());
        assert_eq!(
            original_folder(Path::new("/missing/Game")),
            PathBuf::from("/missing/Game")
        );
        Ok(())
    }

    #[test]
    fn error_chain_includes_sources() {
        let err = AppError::config(
            "metadata.load",
            buildout_config::ConfigError::MetadataMissing {
                path: PathBuf::from("meta.json"),
            },
        );
        assert_eq!(
            error_chain(&err),
            "configuration operation failed: build metadata missing"
        );
    }
}
