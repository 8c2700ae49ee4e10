use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use buildout_app::{
    AppError, BuildCompletionEvent, BuildResult, Orchestrator, Revealer, RunOutcome, SkipReason,
};
use buildout_config::{
    BuildMetadata, JsonMetadataStore, RevealTarget, StandardizationConfig, StaticMetadataStore,
};
use buildout_events::{Event, EventBus, RunState};
use buildout_fsops::BuildTarget;
use buildout_test_support::{fixtures, tree};

#[derive(Default)]
struct RecordingRevealer {
    revealed: Mutex<Vec<PathBuf>>,
}

impl RecordingRevealer {
    fn paths(&self) -> Vec<PathBuf> {
        self.revealed
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }
}

impl Revealer for RecordingRevealer {
    fn reveal(&self, path: &Path) -> io::Result<()> {
        self.revealed
            .lock()
            .map_err(|_| io::Error::other("poisoned"))?
            .push(path.to_path_buf());
        Ok(())
    }
}

struct BrokenRevealer;

impl Revealer for BrokenRevealer {
    fn reveal(&self, _path: &Path) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no file browser"))
    }
}

struct Harness {
    _workspace: tempfile::TempDir,
    source: PathBuf,
    destination_root: PathBuf,
    events: EventBus,
    revealer: Arc<RecordingRevealer>,
    orchestrator: Orchestrator,
}

fn harness(configure: impl FnOnce(&mut StandardizationConfig)) -> anyhow::Result<Harness> {
    let workspace = tempfile::tempdir()?;
    let source = workspace.path().join("raw");
    let destination_root = workspace.path().join("Builds");
    let mut config = StandardizationConfig {
        destination_root: destination_root.clone(),
        copy_threads: Some(2),
        ..StandardizationConfig::default()
    };
    configure(&mut config);

    let events = EventBus::with_capacity(64);
    let revealer = Arc::new(RecordingRevealer::default());
    let metadata = Arc::new(StaticMetadataStore::new(BuildMetadata::new(
        "Courier",
        "2026.1018.0930",
    )));
    let orchestrator =
        Orchestrator::new(config, metadata, events.clone())?.with_revealer(revealer.clone());
    Ok(Harness {
        _workspace: workspace,
        source,
        destination_root,
        events,
        revealer,
        orchestrator,
    })
}

fn completed(target: BuildTarget, output_path: &Path) -> BuildCompletionEvent {
    BuildCompletionEvent {
        result: BuildResult::Succeeded,
        target,
        output_path: output_path.to_path_buf(),
    }
}

fn states(events: &EventBus) -> Vec<RunState> {
    events
        .snapshot()
        .into_iter()
        .filter_map(|envelope| match envelope.event {
            Event::StateChanged { state, .. } => Some(state),
            _ => None,
        })
        .collect()
}

fn kinds(events: &EventBus) -> Vec<&'static str> {
    events
        .snapshot()
        .iter()
        .map(|envelope| envelope.event.kind())
        .collect()
}

#[test]
fn successful_build_is_standardized_and_revealed() -> anyhow::Result<()> {
    let harness = harness(|_| {})?;
    let exe = fixtures::desktop_build(&harness.source, "Game")?;

    let outcome = harness
        .orchestrator
        .run(completed(BuildTarget::StandaloneWindows64, &exe))?;

    let expected = harness
        .destination_root
        .join("StandaloneWindows64")
        .join("Courier (StandaloneWindows64) v2026.1018.0930");
    let RunOutcome::Standardized(output) = outcome else {
        anyhow::bail!("expected standardized output, got {outcome:?}");
    };
    assert_eq!(output.destination, expected);
    assert!(output.revealed);
    assert_eq!(output.report.files_copied, 5);
    assert!(expected.join("Courier.exe").is_file());
    assert!(!expected.join("Game_BackUpThisFolder_ButDontShipItWithYourGame").exists());
    assert_eq!(harness.revealer.paths(), vec![expected]);

    assert_eq!(
        states(&harness.events),
        vec![
            RunState::Idle,
            RunState::Planning,
            RunState::Cleaning,
            RunState::Copying,
            RunState::Done,
            RunState::Revealing,
        ]
    );
    let kinds = kinds(&harness.events);
    assert_eq!(kinds.first(), Some(&"run_started"));
    assert_eq!(kinds.last(), Some(&"run_completed"));
    let run_ids: Vec<_> = harness
        .events
        .snapshot()
        .iter()
        .map(|envelope| envelope.event.run_id())
        .collect();
    assert!(run_ids.iter().all(|id| *id == output.run_id));
    Ok(())
}

#[test]
fn grouping_by_name_and_target_nests_destination() -> anyhow::Result<()> {
    let harness = harness(|config| {
        config.group_by_build_name = true;
        config.group_by_build_target = true;
        config.reveal_after_copy = false;
    })?;
    let site = fixtures::webgl_build(&harness.source)?;

    let outcome = harness.orchestrator.run(completed(BuildTarget::WebGl, &site))?;

    let expected = harness
        .destination_root
        .join("Courier")
        .join("WebGL")
        .join("Courier (WebGL) v2026.1018.0930");
    let RunOutcome::Standardized(output) = outcome else {
        anyhow::bail!("expected standardized output, got {outcome:?}");
    };
    assert_eq!(output.destination, expected);
    assert!(!output.revealed);
    assert!(harness.revealer.paths().is_empty());
    tree::assert_same_tree(&site, &expected.join("WebGL"))?;
    assert!(!states(&harness.events).contains(&RunState::Revealing));
    Ok(())
}

#[test]
fn rerunning_replaces_previous_output() -> anyhow::Result<()> {
    let harness = harness(|config| config.group_by_build_target = false)?;
    let bundle = fixtures::mac_bundle(&harness.source, "Game")?;
    let event = completed(BuildTarget::StandaloneOsx, &bundle);

    harness.orchestrator.run(event.clone())?;
    let leaf = harness
        .destination_root
        .join("Courier (StandaloneOSX) v2026.1018.0930");
    fixtures::write_file(&leaf, "stale.log", b"left behind")?;
    harness.orchestrator.run(event)?;

    assert!(!leaf.join("stale.log").exists());
    tree::assert_same_tree(&bundle, &leaf.join("Courier.app"))?;
    Ok(())
}

#[test]
fn unsuccessful_builds_produce_no_output() -> anyhow::Result<()> {
    for result in [BuildResult::Failed, BuildResult::Cancelled, BuildResult::Unknown] {
        let harness = harness(|_| {})?;
        let exe = fixtures::desktop_build(&harness.source, "Game")?;

        let err = harness
            .orchestrator
            .run(BuildCompletionEvent {
                result,
                target: BuildTarget::StandaloneWindows64,
                output_path: exe,
            })
            .expect_err("unsuccessful build must not be standardized");

        assert!(matches!(err, AppError::BuildNotSucceeded { result: reported } if reported == result));
        assert!(!harness.destination_root.exists());
        assert!(harness.revealer.paths().is_empty());
        assert_eq!(
            states(&harness.events),
            vec![RunState::Idle, RunState::Failed]
        );
        assert_eq!(kinds(&harness.events).last(), Some(&"run_failed"));
    }
    Ok(())
}

#[test]
fn unsupported_or_disabled_runs_are_skipped() -> anyhow::Result<()> {
    let harness = harness(|_| {})?;
    fs::create_dir_all(&harness.source)?;
    let outcome = harness.orchestrator.run(completed(
        BuildTarget::Other("Switch".to_string()),
        &harness.source,
    ))?;
    assert!(matches!(
        outcome,
        RunOutcome::Skipped {
            reason: SkipReason::UnsupportedPlatform,
            ..
        }
    ));
    assert!(!harness.destination_root.exists());
    assert_eq!(harness.revealer.paths(), vec![harness.source.clone()]);

    let disabled = self::harness(|config| config.create_standardized_output = false)?;
    let exe = fixtures::desktop_build(&disabled.source, "Game")?;
    let outcome = disabled
        .orchestrator
        .run(completed(BuildTarget::StandaloneLinux64, &exe))?;
    assert!(matches!(
        outcome,
        RunOutcome::Skipped {
            reason: SkipReason::Disabled,
            ..
        }
    ));
    assert!(!disabled.destination_root.exists());
    assert_eq!(kinds(&disabled.events).last(), Some(&"run_skipped"));
    let player_folder = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    assert_eq!(disabled.revealer.paths(), vec![player_folder]);
    Ok(())
}

#[test]
fn skipped_runs_reveal_nothing_when_revealing_is_off() -> anyhow::Result<()> {
    let harness = harness(|config| config.reveal_after_copy = false)?;
    fs::create_dir_all(&harness.source)?;
    let outcome = harness.orchestrator.run(completed(
        BuildTarget::Other("Switch".to_string()),
        &harness.source,
    ))?;
    assert!(matches!(outcome, RunOutcome::Skipped { revealed: false, .. }));
    assert!(harness.revealer.paths().is_empty());
    Ok(())
}

#[test]
fn reveal_target_selects_original_standardized_or_both() -> anyhow::Result<()> {
    for (reveal_target, expect_original, expect_standardized) in [
        (RevealTarget::Original, true, false),
        (RevealTarget::Standardized, false, true),
        (RevealTarget::Both, true, true),
    ] {
        let harness = harness(|config| config.reveal_target = reveal_target)?;
        let exe = fixtures::desktop_build(&harness.source, "Game")?;
        let outcome = harness
            .orchestrator
            .run(completed(BuildTarget::StandaloneWindows64, &exe))?;
        let RunOutcome::Standardized(output) = outcome else {
            anyhow::bail!("expected standardized output, got {outcome:?}");
        };

        let mut expected = Vec::new();
        if expect_original {
            expected.push(exe.parent().map(Path::to_path_buf).unwrap_or_default());
        }
        if expect_standardized {
            expected.push(output.destination.clone());
        }
        assert_eq!(harness.revealer.paths(), expected, "{}", reveal_target.as_str());
        assert!(output.revealed);
    }
    Ok(())
}

fn stamped_store(workspace: &Path) -> anyhow::Result<JsonMetadataStore> {
    let store = JsonMetadataStore::new(workspace.join("buildout.metadata.json"));
    store.save(&BuildMetadata::new("Courier", "1.0-2026.1018.0930"))?;
    Ok(store)
}

#[test]
fn metadata_is_cleaned_after_success_and_failure() -> anyhow::Result<()> {
    let workspace = tempfile::tempdir()?;
    let exe = fixtures::desktop_build(&workspace.path().join("raw"), "Game")?;
    let config = StandardizationConfig {
        destination_root: workspace.path().join("Builds"),
        reveal_after_copy: false,
        clean_metadata_after_run: true,
        ..StandardizationConfig::default()
    };

    let store = stamped_store(workspace.path())?;
    let metadata_path = store.path().to_path_buf();
    let orchestrator = Orchestrator::new(config, Arc::new(store), EventBus::new())?;
    orchestrator.run(completed(BuildTarget::StandaloneLinux64, &exe))?;
    assert!(!metadata_path.exists());

    stamped_store(workspace.path())?;
    let failed = orchestrator.run(BuildCompletionEvent {
        result: BuildResult::Failed,
        target: BuildTarget::StandaloneLinux64,
        output_path: exe,
    });
    assert!(failed.is_err());
    assert!(!metadata_path.exists());
    Ok(())
}

#[test]
fn metadata_is_kept_unless_cleanup_is_enabled() -> anyhow::Result<()> {
    let workspace = tempfile::tempdir()?;
    let exe = fixtures::desktop_build(&workspace.path().join("raw"), "Game")?;
    let config = StandardizationConfig {
        destination_root: workspace.path().join("Builds"),
        reveal_after_copy: false,
        ..StandardizationConfig::default()
    };
    let store = stamped_store(workspace.path())?;
    let metadata_path = store.path().to_path_buf();
    let orchestrator = Orchestrator::new(config, Arc::new(store), EventBus::new())?;

    orchestrator.run(completed(BuildTarget::StandaloneLinux64, &exe))?;
    assert!(metadata_path.is_file());
    Ok(())
}

#[cfg(unix)]
#[test]
fn unwritable_destination_root_is_a_validation_error() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let harness = harness(|config| config.reveal_after_copy = false)?;
    let exe = fixtures::desktop_build(&harness.source, "Game")?;
    fs::create_dir_all(&harness.destination_root)?;
    fs::set_permissions(&harness.destination_root, fs::Permissions::from_mode(0o555))?;
    // Privileged users bypass permission bits.
    if fs::write(harness.destination_root.join("writable-check"), b"").is_ok() {
        fs::set_permissions(&harness.destination_root, fs::Permissions::from_mode(0o755))?;
        return Ok(());
    }

    let result = harness
        .orchestrator
        .run(completed(BuildTarget::StandaloneWindows64, &exe));
    fs::set_permissions(&harness.destination_root, fs::Permissions::from_mode(0o755))?;

    let err = result.expect_err("read-only destination root must fail");
    assert!(err.is_validation());
    assert_eq!(err.operation(), "copier.reset");
    Ok(())
}

#[test]
fn missing_source_keeps_previous_output() -> anyhow::Result<()> {
    let harness = harness(|config| config.reveal_after_copy = false)?;
    let exe = fixtures::desktop_build(&harness.source, "Game")?;
    harness
        .orchestrator
        .run(completed(BuildTarget::StandaloneWindows, &exe))?;
    let leaf = harness
        .destination_root
        .join("StandaloneWindows")
        .join("Courier (StandaloneWindows) v2026.1018.0930");
    let before = tree::snapshot(&leaf)?;

    let err = harness
        .orchestrator
        .run(completed(
            BuildTarget::StandaloneWindows,
            &harness.source.join("gone/Game.exe"),
        ))
        .expect_err("missing source must fail");

    assert_eq!(err.operation(), "copier.plan");
    assert_eq!(tree::snapshot(&leaf)?, before);
    let states = states(&harness.events);
    assert_eq!(
        &states[states.len() - 2..],
        &[RunState::Planning, RunState::Failed]
    );
    Ok(())
}

#[test]
fn missing_metadata_fails_during_planning() -> anyhow::Result<()> {
    let workspace = tempfile::tempdir()?;
    let exe = fixtures::desktop_build(&workspace.path().join("raw"), "Game")?;
    let events = EventBus::with_capacity(16);
    let store = JsonMetadataStore::new(workspace.path().join("buildout.metadata.json"));
    let config = StandardizationConfig {
        destination_root: workspace.path().join("Builds"),
        ..StandardizationConfig::default()
    };
    let orchestrator = Orchestrator::new(config, Arc::new(store), events.clone())?
        .with_revealer(Arc::new(RecordingRevealer::default()));

    let err = orchestrator
        .run(completed(BuildTarget::StandaloneLinux64, &exe))
        .expect_err("metadata is required");

    assert_eq!(err.operation(), "metadata.load");
    assert!(!workspace.path().join("Builds").exists());
    let failure = events
        .snapshot()
        .into_iter()
        .find_map(|envelope| match envelope.event {
            Event::RunFailed {
                operation, message, ..
            } => Some((operation, message)),
            _ => None,
        });
    let (operation, message) = failure.ok_or_else(|| anyhow::anyhow!("no run_failed event"))?;
    assert_eq!(operation, "metadata.load");
    assert!(message.contains("build metadata missing"));
    Ok(())
}

#[test]
fn invalid_build_name_is_rejected_before_cleanup() -> anyhow::Result<()> {
    let workspace = tempfile::tempdir()?;
    let exe = fixtures::desktop_build(&workspace.path().join("raw"), "Game")?;
    let config = StandardizationConfig {
        destination_root: workspace.path().join("Builds"),
        ..StandardizationConfig::default()
    };
    let metadata = Arc::new(StaticMetadataStore::new(BuildMetadata::new("../escape", "1.0")));
    let orchestrator = Orchestrator::new(config, metadata, EventBus::new())?
        .with_revealer(Arc::new(RecordingRevealer::default()));

    let err = orchestrator
        .run(completed(BuildTarget::StandaloneWindows64, &exe))
        .expect_err("path separators are not allowed in names");
    assert!(err.is_validation());
    assert_eq!(err.operation(), "planner.validate");
    assert!(!workspace.path().join("Builds").exists());
    Ok(())
}

#[test]
fn reveal_failures_do_not_fail_the_run() -> anyhow::Result<()> {
    let workspace = tempfile::tempdir()?;
    let site = fixtures::webgl_build(workspace.path())?;
    let config = StandardizationConfig {
        destination_root: workspace.path().join("Builds"),
        ..StandardizationConfig::default()
    };
    let metadata = Arc::new(StaticMetadataStore::new(BuildMetadata::new("Courier", "1.0")));
    let orchestrator = Orchestrator::new(config, metadata, EventBus::new())?
        .with_revealer(Arc::new(BrokenRevealer));

    let outcome = orchestrator.run(completed(BuildTarget::WebGl, &site))?;
    let RunOutcome::Standardized(output) = outcome else {
        anyhow::bail!("expected standardized output, got {outcome:?}");
    };
    assert!(!output.revealed);
    assert!(output.destination.join("WebGL/index.html").is_file());
    Ok(())
}

#[test]
fn destination_for_matches_run_destination() -> anyhow::Result<()> {
    let harness = harness(|config| config.reveal_after_copy = false)?;
    let package = fixtures::android_package(&harness.source, "Game", ".apk")?;
    let planned = harness.orchestrator.destination_for(&BuildTarget::Android)?;

    let outcome = harness
        .orchestrator
        .run(completed(BuildTarget::Android, &package))?;
    let RunOutcome::Standardized(output) = outcome else {
        anyhow::bail!("expected standardized output, got {outcome:?}");
    };
    assert_eq!(output.destination, planned);
    assert_eq!(tree::file_names(&planned)?, vec!["Courier.apk"]);
    Ok(())
}
