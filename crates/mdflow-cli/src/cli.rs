use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "mdflow developers",
    version,
    about = "mdflow - Run batches of molecular-dynamics jobs from a shared workspace and reduce their output to physical quantities.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel post-processing.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the workspace layout and queue one job per campaign combination.
    Startup(StartupArgs),
    /// Claim and run queued jobs until the queue is empty.
    Worker(WorkerArgs),
    /// Show how many jobs sit in each store of the workspace.
    Status(WorkspaceArgs),
    /// Evaluate every completed job and write one result table.
    PostProcess(WorkspaceArgs),
    /// Fit an equation of state to every volume series among the completed jobs.
    Volume(VolumeArgs),
    /// Merge the partial tables left by workers into one result table.
    Merge(WorkspaceArgs),
}

/// Locates the workspace, either directly or through a configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceArgs {
    /// Root directory of the workspace. Overrides `workspace` from the config file.
    #[arg(short, long, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Path to the campaign configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `startup` subcommand.
#[derive(Args, Debug)]
pub struct StartupArgs {
    #[command(flatten)]
    pub location: WorkspaceArgs,
}

/// Arguments for the `worker` subcommand.
#[derive(Args, Debug)]
pub struct WorkerArgs {
    #[command(flatten)]
    pub location: WorkspaceArgs,

    /// Override the integrator program from the config file.
    #[arg(short, long, value_name = "PROGRAM")]
    pub program: Option<String>,

    /// Extra argument passed to the integrator before the descriptor path.
    /// Can be used multiple times and replaces `engine.args` from the config file.
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    pub program_args: Vec<String>,

    /// Stop after this many jobs even if the queue is not empty.
    #[arg(short = 'n', long, value_name = "INT")]
    pub max_jobs: Option<usize>,

    /// Move finished jobs to the done store without analyzing them.
    #[arg(long)]
    pub no_analysis: bool,
}

/// Arguments for the `volume` subcommand.
#[derive(Args, Debug)]
pub struct VolumeArgs {
    #[command(flatten)]
    pub location: WorkspaceArgs,

    /// Delete the outputs and descriptors of every member except the optimal one.
    #[arg(long)]
    pub prune_non_optimal: bool,
}
