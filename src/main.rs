//! Octagon-AI command line
//!
//! Scrapes ufcstats.com and predicts fight outcomes.

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "octagon_ai=info,octagon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Index => cli::run_index().await,
        Commands::Crawl {
            limit,
            concurrency,
            keep_going,
            reuse_index,
        } => cli::run_crawl(limit, concurrency, keep_going, reuse_index).await,
        Commands::Export { output } => cli::run_export(output),
        Commands::Evaluate {
            test_fraction,
            seed,
            format,
        } => cli::run_evaluate(test_fraction, seed, format),
        Commands::Predict {
            favorite,
            underdog,
            format,
        } => cli::run_predict(favorite, underdog, format),
    }
}
