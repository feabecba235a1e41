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
    author = "The foldscore developers",
    version,
    about = "foldscore CLI - Score coarse protein backbone structures and rescore them incrementally after moves.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a structure, score it, then apply its moves and rescore after each one.
    Score(ScoreArgs),
    /// Score an explicit atom and residue snapshot in a single pass.
    Evaluate(EvaluateArgs),
}

/// Engine settings shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Path to an engine configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the neighbor-grid voxel edge length (Å).
    #[arg(long, value_name = "FLOAT")]
    pub voxel_size: Option<f64>,

    /// Override the pair interaction radius (Å).
    #[arg(short, long, value_name = "FLOAT")]
    pub radius: Option<f64>,

    /// Set a term weight, overriding the config file.
    /// Can be used multiple times. Example: -S hbond=2.0
    #[arg(short = 'S', long = "set", value_name = "TERM=WEIGHT", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Path to the structure file (sequence, backbone coordinates and moves) in TOML format.
    #[arg(short = 'i', long, required = true, value_name = "PATH")]
    pub structure: PathBuf,

    /// Write the report to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Arguments for the `evaluate` subcommand.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to the snapshot request in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Write the report to this file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub engine: EngineArgs,
}
