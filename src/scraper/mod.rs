//! Web scraper module for ufcstats.com
//!
//! Provides page fetching, HTML parsing and the crawl drivers.

pub mod cache;
pub mod crawler;
pub mod fetcher;
pub mod index;
pub mod parsers;

pub use cache::{CacheCategory, PageCache};
pub use crawler::{CrawlFailure, CrawlOptions, CrawlOutput, CrawlReport, Crawler, ProfileOutcome};
pub use fetcher::Fetcher;
pub use index::FighterIndexBuilder;

use scraper::Html;

use crate::types::FighterUrl;

/// Base URL for ufcstats.com
pub const BASE_URL: &str = "http://ufcstats.com";

/// Build fighter listing URL; page 0 is the unpaginated first page
pub fn listing_url(base_url: &str, letter: char, page: u32) -> String {
    let base = base_url.trim_end_matches('/');
    if page == 0 {
        format!("{}/statistics/fighters?char={}", base, letter)
    } else {
        format!("{}/statistics/fighters?char={}&page={}", base, letter, page)
    }
}

/// A fetched fighter profile page.
///
/// Both the stats and the history extractor work from the same page.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub url: FighterUrl,
    pub html: String,
}

impl ProfilePage {
    pub fn new(url: FighterUrl, html: String) -> Self {
        Self { url, html }
    }

    /// Parse the page into a queryable document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url(BASE_URL, 'a', 0),
            "http://ufcstats.com/statistics/fighters?char=a"
        );
        assert_eq!(
            listing_url("http://ufcstats.com/", 'q', 6),
            "http://ufcstats.com/statistics/fighters?char=q&page=6"
        );
    }
}
