//! HTTP page fetching using reqwest.

use std::time::Duration;
use tracing::debug;

use super::cache::{CacheCategory, PageCache};
use crate::config::ScraperConfig;
use crate::retry::{retry_transient, RetryConfig};
use crate::{Error, Result};

/// Fetches HTML pages with retry and an optional page cache
pub struct Fetcher {
    client: reqwest::Client,
    retry: RetryConfig,
    cache: Option<PageCache>,
}

impl Fetcher {
    pub fn new(config: &ScraperConfig, retry: RetryConfig, cache: Option<PageCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|source| Error::Network {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            retry,
            cache,
        })
    }

    /// Fetch a page body, consulting the cache first
    pub async fn fetch(&self, url: &str, category: CacheCategory) -> Result<String> {
        if let Some(cache) = &self.cache {
            if let Some(html) = cache.get(category, url) {
                debug!("cache hit: {}", url);
                return Ok(html);
            }
        }

        let html = retry_transient(&self.retry, url, || self.fetch_once(url)).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(category, url, &html) {
                tracing::warn!("failed to cache {}: {}", url, e);
            }
        }

        Ok(html)
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| Error::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| Error::Network {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ScraperConfig {
        ScraperConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            ..ScraperConfig::default()
        }
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fighter-details/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>abc</html>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&config_for(&server), RetryConfig::none(), None).unwrap();
        let url = format!("{}/fighter-details/abc", server.uri());
        let html = fetcher.fetch(&url, CacheCategory::Profile).await.unwrap();
        assert_eq!(html, "<html>abc</html>");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&config_for(&server), fast_retry(3), None).unwrap();
        let url = format!("{}/fighter-details/missing", server.uri());
        let err = fetcher.fetch(&url, CacheCategory::Profile).await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = Fetcher::new(&config_for(&server), fast_retry(2), None).unwrap();
        let url = format!("{}/statistics/fighters", server.uri());
        let err = fetcher.fetch(&url, CacheCategory::Listing).await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_cached_page_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>fresh</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::new(dir.path());
        let fetcher = Fetcher::new(&config_for(&server), RetryConfig::none(), Some(cache)).unwrap();
        let url = format!("{}/fighter-details/abc", server.uri());

        let first = fetcher.fetch(&url, CacheCategory::Profile).await.unwrap();
        let second = fetcher.fetch(&url, CacheCategory::Profile).await.unwrap();
        assert_eq!(first, second);
    }
}
