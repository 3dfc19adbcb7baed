use crate::config::file::{FileAveraging, FileField, FileLeadingSlot};
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
    version,
    about = "hnfeat - Rotation-invariant amide-hydrogen environment features from structural ensembles.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Featurize one or more structural ensembles (PDB files or directories of PDB files).
    Featurize(FeaturizeArgs),
    /// Re-aggregate a directory of per-model neighbor-table checkpoints.
    Aggregate(AggregateArgs),
    /// Print the feature-table column layout for a configuration.
    Columns(ColumnsArgs),
}

/// Arguments for the `featurize` subcommand.
#[derive(Args, Debug)]
pub struct FeaturizeArgs {
    /// Input ensembles: multi-model PDB files or directories of single-model PDB files.
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving `<stem>_aggregated.csv` and `<stem>_features.csv`.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// Also write every per-model neighbor table as `<stem>/model_<i>.csv` under this directory.
    #[arg(long, value_name = "DIR")]
    pub checkpoint_dir: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `aggregate` subcommand.
#[derive(Args, Debug)]
pub struct AggregateArgs {
    /// Checkpoint directory of one structure, i.e. `<checkpoint-dir>/<stem>` from `featurize`.
    #[arg(required = true, value_name = "DIR")]
    pub checkpoints: PathBuf,

    /// Directory receiving the aggregated and feature tables.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    /// File-name stem of the written tables. Defaults to the checkpoint directory name.
    #[arg(long, value_name = "NAME")]
    pub stem: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `columns` subcommand.
#[derive(Args, Debug)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Featurization settings shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Search Overrides ---
    /// Neighbors kept per anchor and model.
    #[arg(short = 'n', long, value_name = "INT")]
    pub neighbor_count: Option<usize>,

    /// Neighbors requested from the spatial index before exclusions.
    #[arg(long, value_name = "INT")]
    pub query_count: Option<usize>,

    /// Drop hydrogen neighbors before truncating to the neighbor count.
    #[arg(long)]
    pub exclude_hydrogens: bool,

    // --- Frame and Transform Overrides ---
    /// Maximum N-C distance accepted for the preceding carbonyl carbon.
    #[arg(long, value_name = "FLOAT")]
    pub bond_cutoff: Option<f64>,

    /// Numerator of the inverse-distance metric.
    #[arg(long, value_name = "FLOAT")]
    pub scaling_constant: Option<f64>,

    // --- Aggregation Overrides ---
    /// Fixed ensemble size the summed metric is divided by (e.g. 10).
    ///
    /// Without this flag, `--set aggregation.ensemble-size` or a config-file
    /// value, each input is divided by its own model count instead, so a fixed
    /// divide-by-10 needs `-e 10`.
    #[arg(short = 'e', long, value_name = "INT")]
    pub ensemble_size: Option<usize>,

    /// Neighbors kept per anchor after aggregation.
    #[arg(short = 'k', long, value_name = "INT")]
    pub top_k: Option<usize>,

    /// Normalization of the averaged metric.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub averaging: Option<FileAveraging>,

    // --- Encoding Overrides ---
    /// Categorical fields encoded per slot, in column order.
    #[arg(long, value_enum, value_delimiter = ',', value_name = "FIELD,...")]
    pub fields: Option<Vec<FileField>>,

    /// What occupies slot 1 of every feature row.
    #[arg(long, value_enum, value_name = "SLOT")]
    pub leading_slot: Option<FileLeadingSlot>,

    /// Override `encoding.include-confidence` from the config file.
    #[command(flatten)]
    pub include_confidence: IncludeConfidence,

    // --- Input Overrides ---
    /// Chain to featurize. Defaults to the first chain of each input.
    #[arg(long, value_name = "ID")]
    pub chain: Option<char>,

    /// CSV mapping (residue_name, atom_name) to chemistry labels.
    #[arg(long, value_name = "PATH")]
    pub chemistry_map: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S aggregation.top-k=20
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// A group to handle mutually exclusive flags for the confidence feature.
#[derive(Args, Debug, Default)]
#[group(multiple = false)]
pub struct IncludeConfidence {
    /// Encode per-neighbor confidence (B-factor / 100) in every slot.
    #[arg(long)]
    pub with_confidence: bool,
    /// Never encode the confidence feature.
    #[arg(long)]
    pub no_confidence: bool,
}
