use anyhow::anyhow;
use buildout_config::StandardizationConfig;

use crate::context::{CliError, CliResult};
use crate::output::print_json;

pub(crate) fn handle_config_show(config: &StandardizationConfig) -> CliResult<()> {
    let value = serde_json::to_value(config)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    print_json(&value)
}
