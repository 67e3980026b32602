//! File-based page cache with TTL support.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::Result;

/// Cache entry with timestamp
#[derive(Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    html: String,
    cached_at: DateTime<Utc>,
}

/// Page categories with different TTLs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCategory {
    Listing, // 24 hours
    Profile, // 7 days
}

impl CacheCategory {
    pub fn ttl(&self) -> Duration {
        match self {
            CacheCategory::Listing => Duration::hours(24),
            CacheCategory::Profile => Duration::hours(24 * 7),
        }
    }

    pub fn dir_name(&self) -> &str {
        match self {
            CacheCategory::Listing => "listing",
            CacheCategory::Profile => "profile",
        }
    }
}

/// Cache of fetched HTML keyed by URL
#[derive(Debug, Clone)]
pub struct PageCache {
    base_dir: PathBuf,
}

impl PageCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn category_dir(&self, category: CacheCategory) -> PathBuf {
        self.base_dir.join(category.dir_name())
    }

    fn cache_path(&self, category: CacheCategory, url: &str) -> PathBuf {
        self.category_dir(category)
            .join(format!("{}.json", cache_key(url)))
    }

    /// Get cached HTML if present and not expired
    pub fn get(&self, category: CacheCategory, url: &str) -> Option<String> {
        let path = self.cache_path(category, url);
        let content = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&content).ok()?;

        // Keys are lossy; guard against two URLs sharing a file
        if entry.url != url {
            return None;
        }

        if Utc::now() - entry.cached_at > category.ttl() {
            let _ = std::fs::remove_file(&path);
            return None;
        }

        Some(entry.html)
    }

    /// Store fetched HTML
    pub fn set(&self, category: CacheCategory, url: &str, html: &str) -> Result<()> {
        std::fs::create_dir_all(self.category_dir(category))?;

        let entry = CacheEntry {
            url: url.to_string(),
            html: html.to_string(),
            cached_at: Utc::now(),
        };
        std::fs::write(self.cache_path(category, url), serde_json::to_string(&entry)?)?;
        Ok(())
    }

    /// Clear all cached pages
    pub fn clear_all(&self) -> Result<()> {
        if self.base_dir.exists() {
            std::fs::remove_dir_all(&self.base_dir)?;
        }
        Ok(())
    }
}

/// File-name-safe key derived from a URL
fn cache_key(url: &str) -> String {
    let trimmed = url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
