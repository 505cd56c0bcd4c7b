//! Search configuration

use serde::{Deserialize, Serialize};

/// Result cap applied when a request asks for zero results
pub const DEFAULT_MAX_RESULTS: usize = 200;

/// Hits scoring below this are dropped. Chosen empirically.
pub const DEFAULT_MIN_SCORE: f64 = 0.01;

/// Primary shards per service index
pub const DEFAULT_SHARD_COUNT: u32 = 6;

/// Search engine connection and query tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Comma separated engine URLs; the first one is used
    pub brokers: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Primary shards for newly created indices
    #[serde(default = "default_shard_count")]
    pub shard_count: u32,

    /// Default result cap
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Minimum relevance score
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

impl SearchConfig {
    /// Base URL of the engine, without a trailing slash
    pub fn base_url(&self) -> &str {
        self.brokers
            .split(',')
            .map(str::trim)
            .find(|b| !b.is_empty())
            .unwrap_or("http://localhost:9200")
            .trim_end_matches('/')
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            brokers: "http://localhost:9200".to_string(),
            request_timeout_secs: default_request_timeout(),
            shard_count: DEFAULT_SHARD_COUNT,
            max_results: DEFAULT_MAX_RESULTS,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.config.brokers = brokers.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn shard_count(mut self, shards: u32) -> Self {
        self.config.shard_count = shards;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn min_score(mut self, score: f64) -> Self {
        self.config.min_score = score;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_request_timeout() -> u64 {
    10
}

fn default_shard_count() -> u32 {
    DEFAULT_SHARD_COUNT
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_min_score() -> f64 {
    DEFAULT_MIN_SCORE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_uses_first_broker() {
        let config = SearchConfigBuilder::new()
            .brokers(" http://es-1:9200/ , http://es-2:9200")
            .build();
        assert_eq!(config.base_url(), "http://es-1:9200");
    }

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.max_results, 200);
        assert_eq!(config.shard_count, 6);
    }
}
