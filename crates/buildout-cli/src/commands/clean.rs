use serde_json::json;
use tracing::info;

use crate::context::{CliError, CliResult, ProjectContext};
use crate::output::{OutputFormat, print_json};

pub(crate) fn handle_clean(ctx: &ProjectContext, format: OutputFormat) -> CliResult<()> {
    let removed = ctx.bootstrap.clear_metadata().map_err(CliError::from)?;
    let path = ctx.bootstrap.metadata_store().path().to_path_buf();
    info!(path = %path.display(), removed, "metadata cleanup requested");
    match format {
        OutputFormat::Json => print_json(&json!({
            "metadata": path.display().to_string(),
            "removed": removed,
        })),
        OutputFormat::Table => {
            if removed {
                println!("removed: {}", path.display());
            } else {
                println!("nothing to remove: {}", path.display());
            }
            Ok(())
        }
    }
}
