//! Fighter index builder.
//!
//! Walks every letter's listing pages and collects the set of unique
//! profile URLs.

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::cache::CacheCategory;
use super::fetcher::Fetcher;
use super::listing_url;
use super::parsers::ListingParser;
use crate::types::FighterUrl;
use crate::Result;

/// Builds the deduplicated set of fighter profile URLs
pub struct FighterIndexBuilder<'a> {
    fetcher: &'a Fetcher,
    base_url: String,
    pages_per_letter: u32,
}

impl<'a> FighterIndexBuilder<'a> {
    pub fn new(fetcher: &'a Fetcher, base_url: &str, pages_per_letter: u32) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            pages_per_letter,
        }
    }

    /// Every listing page to visit, letter-major
    pub fn listing_urls(&self) -> Vec<String> {
        ('a'..='z')
            .flat_map(|letter| {
                (0..self.pages_per_letter).map(move |page| (letter, page))
            })
            .map(|(letter, page)| listing_url(&self.base_url, letter, page))
            .collect()
    }

    /// Fetch every listing page and collect the unique profile URLs.
    ///
    /// The first page that still fails after retries aborts the build.
    pub async fn build(&self) -> Result<BTreeSet<FighterUrl>> {
        let pages = self.listing_urls();
        let mut fighters = BTreeSet::new();

        for (i, url) in pages.iter().enumerate() {
            let html = self.fetcher.fetch(url, CacheCategory::Listing).await?;
            let before = fighters.len();
            collect_links(&mut fighters, &self.base_url, &ListingParser::parse(&html));
            debug!(
                "listing {}/{} {}: {} new fighters",
                i + 1,
                pages.len(),
                url,
                fighters.len() - before
            );
        }

        info!("Indexed {} unique fighters from {} listing pages", fighters.len(), pages.len());
        Ok(fighters)
    }
}

/// Add listing links to the set, resolving site-relative links
pub fn collect_links(fighters: &mut BTreeSet<FighterUrl>, base_url: &str, links: &[String]) {
    for href in links {
        let url = if href.starts_with('/') {
            format!("{}{}", base_url.trim_end_matches('/'), href)
        } else {
            href.clone()
        };
        fighters.insert(FighterUrl::new(url));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::retry::RetryConfig;
    use crate::Error;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listing(hrefs: &[&str]) -> String {
        let cells: String = hrefs
            .iter()
            .map(|h| {
                format!(
                    r#"<tr><td class="b-statistics__table-col"><a href="{h}">First</a></td><td class="b-statistics__table-col"><a href="{h}">Last</a></td></tr>"#
                )
            })
            .collect();
        format!("<html><body><table><tbody>{}</tbody></table></body></html>", cells)
    }

    fn fetcher_for(server: &MockServer) -> Fetcher {
        let config = ScraperConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            ..ScraperConfig::default()
        };
        Fetcher::new(&config, RetryConfig::none(), None).unwrap()
    }

    #[test]
    fn test_two_pages_linking_same_profile_yield_one_entry() {
        let mut fighters = BTreeSet::new();
        let shared = "http://ufcstats.com/fighter-details/07f72a2a7591b409";
        let page_a = ListingParser::parse(&listing(&[shared]));
        let page_b = ListingParser::parse(&listing(&[shared]));

        collect_links(&mut fighters, "http://ufcstats.com", &page_a);
        collect_links(&mut fighters, "http://ufcstats.com", &page_b);

        assert_eq!(fighters.len(), 1);
        assert!(fighters.contains(&FighterUrl::from(shared)));
    }

    #[test]
    fn test_relative_links_are_resolved() {
        let mut fighters = BTreeSet::new();
        collect_links(
            &mut fighters,
            "http://ufcstats.com/",
            &["/fighter-details/abc".to_string()],
        );
        assert!(fighters.contains(&FighterUrl::from("http://ufcstats.com/fighter-details/abc")));
    }

    #[tokio::test]
    async fn test_listing_urls() {
        let server = MockServer::start().await;
        let fetcher = fetcher_for(&server);
        let builder = FighterIndexBuilder::new(&fetcher, "http://ufcstats.com", 7);
        let urls = builder.listing_urls();

        assert_eq!(urls.len(), 26 * 7);
        assert_eq!(urls[0], "http://ufcstats.com/statistics/fighters?char=a");
        assert_eq!(urls[3], "http://ufcstats.com/statistics/fighters?char=a&page=3");
        assert_eq!(urls[7], "http://ufcstats.com/statistics/fighters?char=b");
        assert_eq!(urls[26 * 7 - 1], "http://ufcstats.com/statistics/fighters?char=z&page=6");
    }

    #[tokio::test]
    async fn test_build_deduplicates_across_pages() {
        let server = MockServer::start().await;
        let shared = format!("{}/fighter-details/shared", server.uri());
        Mock::given(method("GET"))
            .and(path("/statistics/fighters"))
            .and(query_param("char", "a"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
                &shared,
                "/fighter-details/only-a",
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/statistics/fighters"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[&shared])))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let builder = FighterIndexBuilder::new(&fetcher, &server.uri(), 2);
        let fighters = builder.build().await.unwrap();

        assert_eq!(fighters.len(), 2);
        assert!(fighters.contains(&FighterUrl::new(shared)));
        assert!(fighters.contains(&FighterUrl::new(format!(
            "{}/fighter-details/only-a",
            server.uri()
        ))));
    }

    #[tokio::test]
    async fn test_failed_page_aborts_build() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("char", "c"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing(&["/fighter-details/x"])))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let builder = FighterIndexBuilder::new(&fetcher, &server.uri(), 1);
        let err = builder.build().await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    }
}
