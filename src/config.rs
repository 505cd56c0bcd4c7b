use crate::error::Result;
use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Search engine configuration
    pub elasticsearch: SearchConfig,

    /// Identity and tenant header configuration
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and the environment.
    ///
    /// `path` takes precedence over `CONFIG_PATH`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path
            .map(str::to_string)
            .or_else(|| std::env::var("CONFIG_PATH").ok())
            .unwrap_or_else(|| "config/discovery.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: DISCOVERY_)
            .add_source(
                config::Environment::with_prefix("DISCOVERY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Where tenant and user identity are read from on inbound requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Header carrying a namespace UUID or name
    #[serde(default = "default_namespace_header")]
    pub namespace_header_key: String,

    /// Header carrying the caller's user identifier
    #[serde(default = "default_uuid_header")]
    pub uuid_header_key: String,

    /// Bearer token claim holding the namespace identifier
    #[serde(default = "default_namespace_claim")]
    pub namespace_claim: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            namespace_header_key: default_namespace_header(),
            uuid_header_key: default_uuid_header(),
            namespace_claim: default_namespace_claim(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_namespace_header() -> String {
    "x-namespace".to_string()
}

fn default_uuid_header() -> String {
    "Compass-User-UUID".to_string()
}

fn default_namespace_claim() -> String {
    "namespace_id".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        assert_eq!(default_http_port(), 8080);
        assert_eq!(default_log_level(), "info");
        let identity = IdentityConfig::default();
        assert_eq!(identity.namespace_header_key, "x-namespace");
        assert_eq!(identity.namespace_claim, "namespace_id");
    }

    #[test]
    fn test_load_embedded_defaults() {
        let config = Config::load(Some("does/not/exist.toml")).unwrap();
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.elasticsearch.max_results, 200);
        assert_eq!(config.elasticsearch.shard_count, 6);
        assert!((config.elasticsearch.min_score - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let err = Config::load(Some("tests/fixtures/invalid_config.toml")).unwrap_err();
        assert!(matches!(err, crate::error::AppError::Configuration(_)));
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }
}
