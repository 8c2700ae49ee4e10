use anyhow::anyhow;
use buildout_app::{BuildCompletionEvent, BuildResult, RunOutcome};
use buildout_config::StandardizationConfig;
use buildout_events::{Event, EventBus, EventStream};
use tokio::task;
use tracing::{debug, info, warn};

use crate::cli::StandardizeArgs;
use crate::context::{CliError, CliResult, ProjectContext};
use crate::output::{OutputFormat, render_outcome};

const EVENT_CAPACITY: usize = 64;

pub(crate) async fn handle_standardize(
    ctx: &ProjectContext,
    config: StandardizationConfig,
    args: StandardizeArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let outcome = standardize(ctx, config, args).await?;
    render_outcome(&outcome, format)
}

pub(crate) async fn standardize(
    ctx: &ProjectContext,
    config: StandardizationConfig,
    args: StandardizeArgs,
) -> CliResult<RunOutcome> {
    let events = EventBus::with_capacity(EVENT_CAPACITY);
    let orchestrator = ctx.bootstrap.orchestrator(config, events.clone())?;
    let watcher = tokio::spawn(log_events(events.subscribe(None)));
    drop(events);

    let build = BuildCompletionEvent {
        result: BuildResult::from(args.result),
        target: args.target,
        output_path: args.output,
    };
    let result = task::spawn_blocking(move || orchestrator.run(build))
        .await
        .map_err(|err| CliError::failure(anyhow!("standardize task failed: {err}")))?;

    if let Err(err) = watcher.await {
        warn!(error = %err, "event watcher stopped unexpectedly");
    }
    result.map_err(CliError::from)
}

async fn log_events(mut stream: EventStream) {
    while let Some(envelope) = stream.next().await {
        match &envelope.event {
            Event::StateChanged { state, .. } => {
                debug!(event_id = envelope.id, state = state.as_str(), "run state");
            }
            Event::RunCompleted {
                destination,
                files_copied,
                ..
            } => info!(event_id = envelope.id, %destination, files_copied, "run completed"),
            Event::RunFailed {
                operation, message, ..
            } => warn!(event_id = envelope.id, %operation, %message, "run failed"),
            Event::RunSkipped { target, reason, .. } => {
                info!(event_id = envelope.id, %target, %reason, "run skipped");
            }
            Event::RunStarted { .. } => {
                debug!(event_id = envelope.id, kind = envelope.event.kind(), "run event");
            }
        }
    }
}
