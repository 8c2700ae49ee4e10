//! Argument parsing and command dispatch.

use std::path::PathBuf;

use buildout_app::{BuildResult, init_telemetry};
use buildout_config::{RevealTarget, StandardizationConfig};
use buildout_fsops::BuildTarget;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::commands::clean::handle_clean;
use crate::commands::config::handle_config_show;
use crate::commands::plan::handle_plan;
use crate::commands::stamp::handle_stamp;
use crate::commands::standardize::handle_standardize;
use crate::context::{CliResult, ProjectContext};
use crate::output::OutputFormat;

/// Parses CLI arguments, executes the requested command and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = ProjectContext::new(cli.project_root, cli.config, cli.metadata);
    let mut config = ctx.load_config()?;
    if let Err(err) = init_telemetry(&config) {
        eprintln!("warning: logging disabled: {err}");
    }

    match cli.command {
        Command::Standardize(args) => {
            args.apply_to(&mut config);
            handle_standardize(&ctx, config, args, cli.format).await
        }
        Command::Plan(args) => handle_plan(&ctx, config, &args),
        Command::Stamp(args) => handle_stamp(&ctx, args, cli.format),
        Command::Clean => handle_clean(&ctx, cli.format),
        Command::Config => handle_config_show(&config),
    }
}

#[derive(Parser)]
#[command(
    name = "buildout",
    about = "Copy completed builds into a standardized output layout"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "BUILDOUT_PROJECT_ROOT",
        default_value = ".",
        help = "Project folder that relative paths resolve against"
    )]
    pub(crate) project_root: PathBuf,
    #[arg(
        long,
        global = true,
        env = "BUILDOUT_CONFIG",
        help = "Configuration file (defaults to <project-root>/buildout.json)"
    )]
    pub(crate) config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "BUILDOUT_METADATA",
        help = "Build metadata file (defaults to <project-root>/buildout.metadata.json)"
    )]
    pub(crate) metadata: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for command results"
    )]
    pub(crate) format: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Standardize the output of a completed build.
    Standardize(StandardizeArgs),
    /// Print the destination folder for a target without copying.
    Plan(PlanArgs),
    /// Write build metadata before a build starts.
    Stamp(StampArgs),
    /// Remove the build metadata once a build is finished.
    Clean,
    /// Print the resolved configuration.
    Config,
}

#[derive(Args)]
pub(crate) struct StandardizeArgs {
    #[arg(long, help = "Build target, e.g. StandaloneWindows64, iOS, WebGL, Android")]
    pub(crate) target: BuildTarget,
    #[arg(long, help = "Output location the build wrote to")]
    pub(crate) output: PathBuf,
    #[arg(long, value_enum, default_value_t = BuildResultArg::Succeeded)]
    pub(crate) result: BuildResultArg,
    #[arg(long, help = "Skip opening any folder in the file browser")]
    pub(crate) no_reveal: bool,
    #[arg(long, value_enum, help = "Folder to open once the run finishes")]
    pub(crate) reveal: Option<RevealTargetArg>,
    #[arg(long, help = "Remove the build metadata once the run finishes")]
    pub(crate) clean_metadata: bool,
}

impl StandardizeArgs {
    /// Layer the per-run flags over the loaded configuration.
    pub(crate) fn apply_to(&self, config: &mut StandardizationConfig) {
        if self.no_reveal {
            config.reveal_after_copy = false;
        }
        if let Some(reveal) = self.reveal {
            config.reveal_target = reveal.into();
        }
        if self.clean_metadata {
            config.clean_metadata_after_run = true;
        }
    }
}

#[derive(Args)]
pub(crate) struct PlanArgs {
    #[arg(long)]
    pub(crate) target: BuildTarget,
}

#[derive(Args)]
pub(crate) struct StampArgs {
    #[arg(long, help = "Build name (defaults to the project folder name)")]
    pub(crate) build_name: Option<String>,
    #[arg(long)]
    pub(crate) bundle_version: String,
    #[arg(
        long,
        env = "BUILDOUT_BUILD_NUMBER",
        help = "CI build number appended to the bundle version"
    )]
    pub(crate) build_number: Option<String>,
    #[arg(long, help = "Build time as RFC 3339 (defaults to now)")]
    pub(crate) build_time: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum BuildResultArg {
    Succeeded,
    Failed,
    Cancelled,
    Unknown,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum RevealTargetArg {
    Original,
    Standardized,
    Both,
}

impl From<RevealTargetArg> for RevealTarget {
    fn from(value: RevealTargetArg) -> Self {
        match value {
            RevealTargetArg::Original => Self::Original,
            RevealTargetArg::Standardized => Self::Standardized,
            RevealTargetArg::Both => Self::Both,
        }
    }
}

impl From<BuildResultArg> for BuildResult {
    fn from(value: BuildResultArg) -> Self {
        match value {
            BuildResultArg::Succeeded => Self::Succeeded,
            BuildResultArg::Failed => Self::Failed,
            BuildResultArg::Cancelled => Self::Cancelled,
            BuildResultArg::Unknown => Self::Unknown,
        }
    }
}
