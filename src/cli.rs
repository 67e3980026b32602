//! CLI commands for octagon.
//!
//! Crawls ufcstats.com into the local database, exports it, and trains the
//! fight classifier on it.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use octagon_ai::config::AppConfig;
use octagon_ai::dataset::{splitting_data, standardization, MatchupDataset};
use octagon_ai::model::{return_prediction, who_wins_the_upcoming_fight, Verdict};
use octagon_ai::scraper::{CrawlOptions, Crawler, Fetcher, FighterIndexBuilder, PageCache};
use octagon_ai::storage::FighterRepository;
use octagon_ai::types::FighterUrl;

#[derive(Parser)]
#[command(name = "octagon")]
#[command(version, about = "Octagon-AI: UFC fighter scraper and fight outcome classifier", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the fighter index from the alphabetical listing pages
    Index,

    /// Crawl fighter profiles into the database
    Crawl {
        /// Only crawl the first N fighters of the index
        #[arg(short, long)]
        limit: Option<usize>,

        /// Profile pages fetched at once
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Record failing fighters and continue
        #[arg(long)]
        keep_going: bool,

        /// Use the stored index instead of rebuilding it
        #[arg(long)]
        reuse_index: bool,
    },

    /// Export fighters and fights as JSON
    Export {
        /// Output directory
        #[arg(short, long, default_value = "data/export")]
        output: PathBuf,
    },

    /// Train on a stratified split and report test accuracy
    Evaluate {
        /// Share of rows held out for testing
        #[arg(long)]
        test_fraction: Option<f64>,

        /// Split seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Predict the winner of an upcoming fight
    Predict {
        /// Favorite, looked up in the Fighter column
        #[arg(value_name = "FAVORITE")]
        favorite: String,

        /// Underdog, looked up in the Opponent column
        #[arg(value_name = "UNDERDOG")]
        underdog: String,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Debug, Serialize)]
struct EvaluationReport {
    rows: usize,
    dropped_rows: usize,
    train_rows: usize,
    test_rows: usize,
    accuracy: f64,
}

#[derive(Debug, Serialize)]
struct PredictionOutput {
    favorite: String,
    underdog: String,
    verdict: Verdict,
    summary: String,
}

fn open_repository(config: &AppConfig) -> anyhow::Result<FighterRepository> {
    FighterRepository::new(Path::new(&config.storage.db_path))
        .with_context(|| format!("Failed to open database {}", config.storage.db_path))
}

fn build_fetcher(config: &AppConfig) -> anyhow::Result<Fetcher> {
    let cache = config
        .cache
        .enabled
        .then(|| PageCache::new(config.cache.dir.as_str()));
    Ok(Fetcher::new(&config.scraper, config.retry.to_retry_config(), cache)?)
}

fn load_matchups(repo: &FighterRepository) -> anyhow::Result<MatchupDataset> {
    let fighters = repo.load_fighters()?;
    let fights = repo.load_fights()?;
    if fighters.is_empty() || fights.is_empty() {
        anyhow::bail!("No crawled data in the database; run `octagon crawl` first");
    }
    let data = MatchupDataset::build(&fighters, &fights)?;
    if data.is_empty() {
        anyhow::bail!(
            "All {} fight rows were dropped for missing values",
            data.names.dropped.len()
        );
    }
    Ok(data)
}

/// Build and store the fighter index.
pub async fn run_index() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let mut repo = open_repository(&config)?;
    let fetcher = build_fetcher(&config)?;

    let index = FighterIndexBuilder::new(
        &fetcher,
        &config.scraper.base_url,
        config.scraper.pages_per_letter,
    )
    .build()
    .await
    .context("Failed to build fighter index")?;

    repo.save_index(&index)?;
    println!("Indexed {} fighters", index.len());
    Ok(())
}

/// Crawl every indexed profile and replace the stored tables.
pub async fn run_crawl(
    limit: Option<usize>,
    concurrency: Option<usize>,
    keep_going: bool,
    reuse_index: bool,
) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(c) = concurrency {
        config.scraper.concurrency = c;
    }

    let mut repo = open_repository(&config)?;
    let fetcher = build_fetcher(&config)?;

    let index = if reuse_index {
        let index = repo.load_index()?;
        if index.is_empty() {
            anyhow::bail!("No stored fighter index; run `octagon index` first");
        }
        index
    } else {
        let index = FighterIndexBuilder::new(
            &fetcher,
            &config.scraper.base_url,
            config.scraper.pages_per_letter,
        )
        .build()
        .await
        .context("Failed to build fighter index")?;
        repo.save_index(&index)?;
        index
    };

    let urls: Vec<FighterUrl> = index.into_iter().take(limit.unwrap_or(usize::MAX)).collect();
    tracing::info!(
        "Crawling {} profiles with concurrency {}",
        urls.len(),
        config.scraper.concurrency
    );

    let crawler = Crawler::new(
        fetcher,
        CrawlOptions {
            concurrency: config.scraper.concurrency,
            keep_going,
        },
    );
    let output = crawler.crawl_profiles(&urls).await.context("Crawl failed")?;

    repo.replace_fighters(&output.stats)?;
    repo.replace_fights(&output.fights)?;

    println!(
        "Stored {} fighters and {} fights",
        output.stats.len(),
        output.fights.len()
    );
    if !output.failures.is_empty() {
        println!("{} fighters failed:", output.failures.len());
        for failure in &output.failures {
            println!("  {}: {}", failure.url, failure.error);
        }
    }
    Ok(())
}

/// Write the stored tables as JSON.
pub fn run_export(output: PathBuf) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let repo = open_repository(&config)?;

    std::fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let fighters = repo.load_fighters()?;
    let fights = repo.load_fights()?;

    let fighters_path = output.join("fighters.json");
    std::fs::write(&fighters_path, serde_json::to_string_pretty(&fighters)?)?;
    let fights_path = output.join("fights.json");
    std::fs::write(&fights_path, serde_json::to_string_pretty(&fights.columns())?)?;

    println!(
        "Wrote {} fighters to {} and {} fights to {}",
        fighters.len(),
        fighters_path.display(),
        fights.len(),
        fights_path.display()
    );
    Ok(())
}

/// Standardize, split, train and score.
pub fn run_evaluate(test_fraction: Option<f64>, seed: Option<u64>, format: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let repo = open_repository(&config)?;
    let data = load_matchups(&repo)?;

    let stats = standardization(data.features.view())?;
    let split = splitting_data(
        stats.view(),
        data.outcome.view(),
        test_fraction.unwrap_or(config.model.test_fraction),
        seed.unwrap_or(config.model.split_seed),
    )?;

    let predicted = return_prediction(
        split.x_train.view(),
        split.y_train.view(),
        split.x_test.view(),
        &config.model.mlp_params(),
    )?;
    let correct = predicted
        .iter()
        .zip(split.y_test.iter())
        .filter(|(p, t)| p == t)
        .count();

    let report = EvaluationReport {
        rows: data.len(),
        dropped_rows: data.names.dropped.len(),
        train_rows: split.y_train.len(),
        test_rows: split.y_test.len(),
        accuracy: correct as f64 / split.y_test.len() as f64,
    };

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "table" => {
            println!("=== Evaluation ===");
            println!("  Rows:      {} ({} dropped)", report.rows, report.dropped_rows);
            println!("  Train:     {}", report.train_rows);
            println!("  Test:      {}", report.test_rows);
            println!("  Accuracy:  {:.2}%", report.accuracy * 100.0);
        }
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

/// Retrain on everything and predict one fight.
pub fn run_predict(favorite: String, underdog: String, format: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let repo = open_repository(&config)?;
    let data = load_matchups(&repo)?;

    let stats = standardization(data.features.view())?;
    let verdict = who_wins_the_upcoming_fight(
        &favorite,
        &underdog,
        stats.view(),
        data.outcome.view(),
        &data.names,
        &config.model.mlp_params(),
    )?;

    let output = PredictionOutput {
        summary: verdict.describe(&favorite, &underdog),
        favorite,
        underdog,
        verdict,
    };

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "table" => {
            println!("{} vs. {}", output.favorite, output.underdog);
            println!("  Verdict: {}", output.summary);
        }
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
