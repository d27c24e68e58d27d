use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::classify::{AlternatePolicy, ResolutionPriority};
use crate::core::synth::SurfaceDetail;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "matcat")]
#[command(
    about = "Turn folders of PBR texture images into material node graphs with stable catalog IDs"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate materials for every texture folder under a root
    Generate(GenerateArgs),

    /// Show how the textures of one folder are classified
    Classify(ClassifyArgs),

    /// List the catalog ledger of a library as a tree
    Catalog(CatalogArgs),

    /// Initialize a matcat.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser)]
pub struct GenerateArgs {
    /// Root folder of the texture library
    pub root: PathBuf,

    /// Directory holding the catalog ledger
    #[arg(short, long)]
    pub library: Option<PathBuf>,

    /// Material manifest path (defaults to generate.output_file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip catalog ID assignment
    #[arg(long)]
    pub no_catalog: bool,

    /// Do not tag materials with their folder ancestry
    #[arg(long)]
    pub no_tags: bool,

    /// Emit a bare material for folders with no recognized textures
    #[arg(long)]
    pub include_empty: bool,

    /// Additional glob patterns to ignore
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Tie-break among several candidates for one channel
    #[arg(long, value_enum)]
    pub resolution: Option<ResolutionPriority>,

    /// What to do with several albedo candidates
    #[arg(long, value_enum)]
    pub alternate: Option<AlternatePolicy>,

    /// Keep bump, displacement or both when a folder has both
    #[arg(long, value_enum)]
    pub surface_detail: Option<SurfaceDetail>,
}

#[derive(Debug, Parser)]
pub struct ClassifyArgs {
    /// Folder containing texture images
    pub folder: PathBuf,

    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Tie-break among several candidates for one channel
    #[arg(long, value_enum)]
    pub resolution: Option<ResolutionPriority>,

    /// What to do with several albedo candidates
    #[arg(long, value_enum)]
    pub alternate: Option<AlternatePolicy>,
}

#[derive(Debug, Parser)]
pub struct CatalogArgs {
    /// Directory holding the catalog ledger
    pub library: PathBuf,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
