use anyhow::Result;
use clap::Parser;
use matcat::cli::{AppContext, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; progress and reports own stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .init();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Generate(args) => matcat::generate_run(args, &ctx),
        Commands::Classify(args) => matcat::classify_run(args, &ctx),
        Commands::Catalog(args) => matcat::catalog_run(args, &ctx),
        Commands::Init(args) => matcat::infra::config::init(args, &ctx),
        Commands::Completions(args) => matcat::completion::run(args, &ctx),
    }
}
