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
    author = "STCAP Contributors",
    version,
    about = "STCAP CLI - Batch search and annotation of Serine/Threonine capping loops in protein structures.",
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

    /// Set the number of threads used for surface area calculations.
    /// Defaults to the number of available logical cores.
    #[arg(short = 't', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the chains listed in a manifest for capping loops.
    Search(SearchArgs),
    /// Add sequence, secondary structure and backbone dihedrals to a hits table.
    Annotate(AnnotateArgs),
}

/// Options shared by every batch command.
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Directory holding one `<structure_id>.pdb` file per structure.
    #[arg(short = 'd', long, required = true, value_name = "DIR")]
    pub structures: PathBuf,

    /// Path of the CSV table to write.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of structures processed concurrently.
    #[arg(short, long, value_name = "INT")]
    pub jobs: Option<usize>,

    /// Rewrite the output table after this many processed structures.
    #[arg(long, value_name = "INT")]
    pub checkpoint_interval: Option<usize>,

    /// Wall-clock budget per structure, in seconds.
    #[arg(long, value_name = "SECS")]
    pub item_timeout_secs: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S contacts.max-distance=3.2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// CSV file with `structure_id,chain_id` rows.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub manifest: PathBuf,

    #[command(flatten)]
    pub batch: BatchArgs,

    /// First manifest row to process (1-based, inclusive). `0` starts at the first row.
    #[arg(long, value_name = "INT")]
    pub start: Option<usize>,

    /// Last manifest row to process (1-based, inclusive).
    #[arg(long, value_name = "INT")]
    pub end: Option<usize>,

    /// File listing structure ids to skip, one per line.
    #[arg(long, value_name = "PATH")]
    pub skip_list: Option<PathBuf>,

    // --- Search Overrides ---
    /// Override the contact distance threshold (Å).
    #[arg(long, value_name = "FLOAT")]
    pub max_distance: Option<f64>,

    /// Override the contact angle threshold (degrees).
    #[arg(long, value_name = "FLOAT")]
    pub min_angle: Option<f64>,

    /// Override the minimum |ΔSASA| (Å²) of an interface residue.
    #[arg(long, value_name = "FLOAT")]
    pub interface_cutoff: Option<f64>,

    /// Do not compute interfaces; no hit is flagged as surface.
    #[arg(long)]
    pub no_interface: bool,
}

/// Arguments for the `annotate` subcommand.
#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Hits table written by `stcap search`.
    #[arg(long, required = true, value_name = "PATH")]
    pub hits: PathBuf,

    #[command(flatten)]
    pub batch: BatchArgs,
}
