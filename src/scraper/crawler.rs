//! Profile crawl driver.
//!
//! Each fighter is one unit of work returning its own result buffer. Units
//! run through an ordered buffered stream, so results merge in index order
//! regardless of the configured concurrency.

use futures::stream::{self, StreamExt};
use scraper::Html;
use serde::Serialize;
use tracing::{info, warn};

use super::cache::CacheCategory;
use super::fetcher::Fetcher;
use super::parsers::{HistoryParser, StatsParser};
use super::ProfilePage;
use crate::dataset::fights::{FightHistory, FightTable, FighterBouts};
use crate::types::{FighterStatsRecord, FighterUrl};
use crate::Result;

const PROGRESS_EVERY: usize = 50;

/// Crawl behaviour
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Profile pages in flight at once
    pub concurrency: usize,
    /// Record per-fighter failures and continue instead of aborting
    pub keep_going: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            keep_going: false,
        }
    }
}

/// A fighter whose page could not be fetched or parsed
#[derive(Debug, Clone, Serialize)]
pub struct CrawlFailure {
    pub url: FighterUrl,
    pub error: String,
}

/// Results of one crawl pass in index order
#[derive(Debug, Clone)]
pub struct CrawlReport<T> {
    pub items: Vec<T>,
    pub failures: Vec<CrawlFailure>,
}

impl<T> Default for CrawlReport<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Everything extracted from one profile page
#[derive(Debug, Clone)]
pub struct ProfileOutcome {
    pub url: FighterUrl,
    pub stats: FighterStatsRecord,
    pub bouts: FighterBouts,
}

/// Stats and fight table from a combined crawl
#[derive(Debug, Clone)]
pub struct CrawlOutput {
    pub stats: Vec<FighterStatsRecord>,
    pub fights: FightTable,
    pub failures: Vec<CrawlFailure>,
}

fn extract_bouts(document: &Html, url: &str) -> Result<FighterBouts> {
    let bouts = HistoryParser::extract(document, url)?;
    bouts.validate()?;
    Ok(bouts)
}

/// Drives the stats and history extractors over a fighter index
pub struct Crawler {
    fetcher: Fetcher,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(fetcher: Fetcher, options: CrawlOptions) -> Self {
        Self { fetcher, options }
    }

    pub async fn fetch_profile(&self, url: &FighterUrl) -> Result<ProfilePage> {
        let html = self.fetcher.fetch(url.as_str(), CacheCategory::Profile).await?;
        Ok(ProfilePage::new(url.clone(), html))
    }

    /// One stats record per fighter
    pub async fn crawl_stats(&self, urls: &[FighterUrl]) -> Result<CrawlReport<FighterStatsRecord>> {
        self.run(urls, StatsParser::extract).await
    }

    /// Fight history of every fighter with derived win indicators
    pub async fn crawl_fights(&self, urls: &[FighterUrl]) -> Result<(FightTable, Vec<CrawlFailure>)> {
        let report = self.run(urls, extract_bouts).await?;

        let mut history = FightHistory::new();
        for bouts in report.items {
            history.push(bouts)?;
        }
        Ok((history.derive()?, report.failures))
    }

    /// Stats and fight history from a single fetch of each profile
    pub async fn crawl_profiles(&self, urls: &[FighterUrl]) -> Result<CrawlOutput> {
        let report = self
            .run(urls, |document, url| {
                Ok(ProfileOutcome {
                    url: FighterUrl::from(url),
                    stats: StatsParser::extract(document, url)?,
                    bouts: extract_bouts(document, url)?,
                })
            })
            .await?;

        let mut stats = Vec::with_capacity(report.items.len());
        let mut history = FightHistory::new();
        for outcome in report.items {
            stats.push(outcome.stats);
            history.push(outcome.bouts)?;
        }

        Ok(CrawlOutput {
            stats,
            fights: history.derive()?,
            failures: report.failures,
        })
    }

    async fn run<T, F>(&self, urls: &[FighterUrl], extract: F) -> Result<CrawlReport<T>>
    where
        F: Fn(&Html, &str) -> Result<T>,
    {
        let total = urls.len();
        let extract = &extract;

        let mut units = stream::iter(urls)
            .map(|url| async move {
                let result = match self.fetch_profile(url).await {
                    Ok(page) => extract(&page.document(), url.as_str()),
                    Err(e) => Err(e),
                };
                (url, result)
            })
            .buffered(self.options.concurrency.max(1));

        let mut report = CrawlReport::default();
        let mut done = 0;

        while let Some((url, result)) = units.next().await {
            done += 1;
            match result {
                Ok(item) => report.items.push(item),
                Err(e) if self.options.keep_going => {
                    warn!("skipping {}: {}", url, e);
                    report.failures.push(CrawlFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }

            if done % PROGRESS_EVERY == 0 || done == total {
                info!("crawled {}/{} profiles ({} failed)", done, total, report.failures.len());
            }
        }

        Ok(report)
    }
}
