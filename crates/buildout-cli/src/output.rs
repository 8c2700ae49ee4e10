//! Output renderers for command results.

use anyhow::anyhow;
use buildout_app::RunOutcome;
use buildout_config::BuildMetadata;
use clap::ValueEnum;
use serde_json::{Value, json};

use crate::context::{CliError, CliResult};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub(crate) fn outcome_json(outcome: &RunOutcome) -> Value {
    match outcome {
        RunOutcome::Standardized(output) => json!({
            "status": "standardized",
            "run_id": output.run_id,
            "destination": output.destination.display().to_string(),
            "files_copied": output.report.files_copied,
            "bytes_copied": output.report.bytes_copied,
            "revealed": output.revealed,
        }),
        RunOutcome::Skipped {
            target,
            reason,
            revealed,
        } => json!({
            "status": "skipped",
            "target": target.to_string(),
            "reason": reason.as_str(),
            "revealed": revealed,
        }),
    }
}

pub(crate) fn render_outcome(outcome: &RunOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&outcome_json(outcome))?,
        OutputFormat::Table => match outcome {
            RunOutcome::Standardized(output) => {
                println!("destination: {}", output.destination.display());
                println!(
                    "copied: {} files ({})",
                    output.report.files_copied,
                    format_bytes(output.report.bytes_copied)
                );
                println!("run: {}", output.run_id);
            }
            RunOutcome::Skipped { target, reason, .. } => {
                println!("skipped {target}: {reason}");
            }
        },
    }
    Ok(())
}

pub(crate) fn render_metadata(metadata: &BuildMetadata, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::to_value(metadata)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            print_json(&value)?;
        }
        OutputFormat::Table => {
            println!("build name: {}", metadata.build_name);
            println!("full version: {}", metadata.full_version);
        }
    }
    Ok(())
}

pub(crate) fn print_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
