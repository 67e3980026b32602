//! Configuration for Octagon-AI.

use serde::{Deserialize, Serialize};

use crate::model::{Activation, MlpParams, Solver};
use crate::retry::RetryConfig;

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Listing pages per letter (page 0 is unpaginated)
    #[serde(default = "default_pages_per_letter")]
    pub pages_per_letter: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Profile pages fetched at once; 1 keeps the crawl sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_base_url() -> String {
    "http://ufcstats.com".to_string()
}

fn default_pages_per_letter() -> u32 {
    7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("octagon-ai/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_concurrency() -> usize {
    1
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            pages_per_letter: default_pages_per_letter(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            concurrency: default_concurrency(),
        }
    }
}

/// Retry configuration for page fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_delay: std::time::Duration::from_millis(self.initial_delay_ms),
            max_delay: std::time::Duration::from_millis(self.max_delay_ms),
            multiplier: 2.0,
        }
    }
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

fn default_cache_dir() -> String {
    "data/cache/pages".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_cache_dir(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "data/octagon.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Model and training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_hidden_layer_sizes")]
    pub hidden_layer_sizes: Vec<usize>,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub solver: Solver,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate_init: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Weight initialization and shuffling seed; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default = "default_split_seed")]
    pub split_seed: u64,
}

fn default_hidden_layer_sizes() -> Vec<usize> {
    vec![28, 24, 18]
}

fn default_max_iter() -> usize {
    10_000
}

fn default_learning_rate() -> f64 {
    0.001
}

fn default_alpha() -> f64 {
    0.0001
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_split_seed() -> u64 {
    1
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            hidden_layer_sizes: default_hidden_layer_sizes(),
            activation: Activation::default(),
            solver: Solver::default(),
            max_iter: default_max_iter(),
            learning_rate_init: default_learning_rate(),
            alpha: default_alpha(),
            seed: None,
            test_fraction: default_test_fraction(),
            split_seed: default_split_seed(),
        }
    }
}

impl ModelConfig {
    pub fn mlp_params(&self) -> MlpParams {
        MlpParams {
            hidden_layer_sizes: self.hidden_layer_sizes.clone(),
            activation: self.activation,
            solver: self.solver,
            max_iter: self.max_iter,
            learning_rate_init: self.learning_rate_init,
            alpha: self.alpha,
            seed: self.seed,
            ..MlpParams::default()
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional `config` file and the
    /// environment (`OCTAGON__SCRAPER__CONCURRENCY=4`, etc.)
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("OCTAGON")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scraper.base_url, "http://ufcstats.com");
        assert_eq!(config.scraper.pages_per_letter, 7);
        assert_eq!(config.scraper.concurrency, 1);
        assert_eq!(config.model.hidden_layer_sizes, vec![28, 24, 18]);
        assert_eq!(config.model.max_iter, 10_000);
        assert_eq!(config.model.activation, Activation::Logistic);
        assert_eq!(config.model.solver, Solver::Adam);
    }

    #[test]
    fn test_deserialize_partial_model_section() {
        let json = r#"{"model": {"hidden_layer_sizes": [8], "activation": "relu"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.model.hidden_layer_sizes, vec![8]);
        assert_eq!(config.model.activation, Activation::Relu);
        assert_eq!(config.model.max_iter, 10_000);
        assert_eq!(config.storage.db_path, "data/octagon.db");
    }

    #[test]
    fn test_retry_settings_conversion() {
        let retry = RetrySettings::default().to_retry_config();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.initial_delay, std::time::Duration::from_millis(500));
    }
}
