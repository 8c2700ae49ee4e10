use buildout_config::{BuildMetadata, append_build_number};
use buildout_fsops::validate_segment;
use chrono::Utc;
use tracing::info;

use crate::cli::StampArgs;
use crate::context::{CliError, CliResult, ProjectContext};
use crate::output::{OutputFormat, render_metadata};

pub(crate) fn handle_stamp(
    ctx: &ProjectContext,
    args: StampArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let build_name = match args.build_name {
        Some(name) => name,
        None => ctx.bootstrap.default_build_name().map_err(CliError::from)?,
    };
    let bundle_version = append_build_number(&args.bundle_version, args.build_number.as_deref());
    let built_at = args.build_time.unwrap_or_else(Utc::now);
    let metadata = BuildMetadata::stamp(build_name, &bundle_version, built_at);
    validate_segment("build_name", &metadata.build_name)
        .and_then(|()| validate_segment("full_version", &metadata.full_version))
        .map_err(|err| CliError::validation(format!("{err}: {}", describe_invalid(&err))))?;

    let store = ctx.bootstrap.metadata_store();
    store
        .save(&metadata)
        .map_err(|err| CliError::failure(anyhow::Error::from(err).context("writing build metadata")))?;
    info!(path = %store.path().display(), "build stamped");
    render_metadata(&metadata, format)
}

fn describe_invalid(err: &buildout_fsops::FsOpsError) -> String {
    match err {
        buildout_fsops::FsOpsError::InvalidInput { field, reason, .. } => {
            format!("{field} ({reason})")
        }
        other => other.to_string(),
    }
}
