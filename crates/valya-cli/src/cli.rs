use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use valya_format::Version;

#[derive(Parser)]
#[command(
    name = "valya",
    about = "Valya: chunk content into a tree of content-addressed blocks",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Block store directory (overrides the config file)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Index node format for new trees: 1 or 1.1
    #[arg(long = "version-format", global = true)]
    pub version_format: Option<Version>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a file and print its root identifier
    Put(PutArgs),
    /// Show how a file would be chunked without storing anything
    Plan(PlanArgs),
    /// Classify a stored block
    Inspect(InspectArgs),
    /// List stored block identifiers
    List,
}

#[derive(Args)]
pub struct PutArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct PlanArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Identifier in `algorithm-hex` form
    pub id: String,
}
