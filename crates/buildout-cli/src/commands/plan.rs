use std::sync::Arc;

use buildout_app::Orchestrator;
use buildout_config::StandardizationConfig;
use buildout_events::EventBus;

use crate::cli::PlanArgs;
use crate::context::{CliResult, ProjectContext};

pub(crate) fn handle_plan(
    ctx: &ProjectContext,
    config: StandardizationConfig,
    args: &PlanArgs,
) -> CliResult<()> {
    let metadata = Arc::new(ctx.bootstrap.metadata_store());
    let orchestrator = Orchestrator::new(config, metadata, EventBus::with_capacity(1))?;
    let destination = orchestrator.destination_for(&args.target)?;
    println!("{}", destination.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildout_config::{BuildMetadata, EnvOverrides};
    use buildout_fsops::BuildTarget;

    #[test]
    fn plan_requires_metadata() -> anyhow::Result<()> {
        let project = tempfile::tempdir()?;
        let ctx = ProjectContext::new(project.path().to_path_buf(), None, None);
        let err = handle_plan(
            &ctx,
            StandardizationConfig::default(),
            &PlanArgs {
                target: BuildTarget::WebGl,
            },
        )
        .expect_err("metadata is missing");
        assert_eq!(err.exit_code(), 3);
        Ok(())
    }

    #[test]
    fn plan_prints_destination_when_metadata_exists() -> anyhow::Result<()> {
        let project = tempfile::tempdir()?;
        let mut ctx = ProjectContext::new(project.path().to_path_buf(), None, None);
        ctx.bootstrap = ctx.bootstrap.with_env(EnvOverrides::default());
        ctx.bootstrap
            .metadata_store()
            .save(&BuildMetadata::new("Courier", "1.0"))?;
        let config = ctx.load_config()?;
        handle_plan(
            &ctx,
            config,
            &PlanArgs {
                target: BuildTarget::Android,
            },
        )?;
        Ok(())
    }
}
