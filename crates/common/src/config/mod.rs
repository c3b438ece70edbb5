//! Configuration management for PaperWeb services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Bibliographic source configuration
    #[serde(default)]
    pub source: SourceConfig,

    /// Upstream retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Network crawl budgets and pacing
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Network cache configuration
    #[serde(default)]
    pub cache: NetworkCacheConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Inbound rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Semantic Scholar Graph API base URL
    #[serde(default = "default_semantic_scholar_url")]
    pub semantic_scholar_url: String,

    /// Semantic Scholar API key (raises upstream rate limits)
    pub api_key: Option<String>,

    /// OpenAlex API base URL
    #[serde(default = "default_openalex_url")]
    pub openalex_url: String,

    /// arXiv export API base URL
    #[serde(default = "default_arxiv_url")]
    pub arxiv_url: String,

    /// Contact address sent in the client identity
    #[serde(default = "default_contact_email")]
    pub contact_email: String,

    /// Per-request timeout in seconds (clamped to 10-15)
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Attempts per upstream call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    /// Minimum interval between resolutions with an API key (ms)
    #[serde(default = "default_interval_with_key")]
    pub interval_with_key_ms: u64,

    /// Minimum interval between resolutions without an API key (ms)
    #[serde(default = "default_interval_without_key")]
    pub interval_without_key_ms: u64,

    /// Per-request build deadline in seconds, 0 disables it. Past the
    /// deadline the partial network is returned with a warning.
    #[serde(default = "default_build_timeout")]
    pub build_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkCacheConfig {
    /// Backend: redis, postgrest, memory, disabled
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Redis URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Key prefix for namespacing
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// PostgREST base URL (Supabase project URL)
    pub rest_url: Option<String>,

    /// PostgREST service role key
    pub service_key: Option<String>,

    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_semantic_scholar_url() -> String { "https://api.semanticscholar.org/graph/v1".to_string() }
fn default_openalex_url() -> String { "https://api.openalex.org".to_string() }
fn default_arxiv_url() -> String { "https://export.arxiv.org".to_string() }
fn default_contact_email() -> String { "researcher@example.com".to_string() }
fn default_source_timeout() -> u64 { 15 }
fn default_max_attempts() -> u32 { 3 }
fn default_base_delay() -> u64 { 1000 }
fn default_interval_with_key() -> u64 { 1000 }
fn default_interval_without_key() -> u64 { 3000 }
fn default_build_timeout() -> u64 { 600 }
fn default_cache_backend() -> String { "redis".to_string() }
fn default_redis_url() -> String { "redis://localhost:6379".to_string() }
fn default_key_prefix() -> String { "paperweb:network".to_string() }
fn default_cache_ttl() -> u64 { 7 * 24 * 3600 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "paperweb".to_string() }
fn default_rate_limit() -> u32 { 10 }
fn default_burst() -> u32 { 20 }
fn default_enabled() -> bool { true }

/// Shortest allowed upstream timeout
const MIN_SOURCE_TIMEOUT_SECS: u64 = 10;

/// Longest allowed upstream timeout
const MAX_SOURCE_TIMEOUT_SECS: u64 = 15;

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SOURCE__API_KEY=...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl SourceConfig {
    /// Upstream timeout, kept inside the 10-15s window
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .clamp(MIN_SOURCE_TIMEOUT_SECS, MAX_SOURCE_TIMEOUT_SECS),
        )
    }

    /// Client identity sent with every outbound call
    pub fn user_agent(&self) -> String {
        format!("PaperWeb/{} (mailto:{})", crate::VERSION, self.contact_email)
    }

    /// API key, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl CrawlConfig {
    /// Minimum interval between resolutions for the given key setup
    pub fn request_interval(&self, has_api_key: bool) -> Duration {
        if has_api_key {
            Duration::from_millis(self.interval_with_key_ms)
        } else {
            Duration::from_millis(self.interval_without_key_ms)
        }
    }

    pub fn build_timeout(&self) -> Option<Duration> {
        (self.build_timeout_secs > 0).then(|| Duration::from_secs(self.build_timeout_secs))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            semantic_scholar_url: default_semantic_scholar_url(),
            api_key: None,
            openalex_url: default_openalex_url(),
            arxiv_url: default_arxiv_url(),
            contact_email: default_contact_email(),
            timeout_secs: default_source_timeout(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            interval_with_key_ms: default_interval_with_key(),
            interval_without_key_ms: default_interval_without_key(),
            build_timeout_secs: default_build_timeout(),
        }
    }
}

impl Default for NetworkCacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            rest_url: None,
            service_key: None,
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            source: SourceConfig::default(),
            retry: RetryConfig::default(),
            crawl: CrawlConfig::default(),
            cache: NetworkCacheConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.cache.backend, "redis");
    }

    #[test]
    fn test_source_timeout_clamped() {
        let mut source = SourceConfig::default();
        source.timeout_secs = 60;
        assert_eq!(source.timeout(), Duration::from_secs(15));

        source.timeout_secs = 1;
        assert_eq!(source.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_user_agent_has_contact() {
        let source = SourceConfig::default();
        assert!(source.user_agent().contains("mailto:researcher@example.com"));
    }

    #[test]
    fn test_blank_api_key_ignored() {
        let mut source = SourceConfig::default();
        source.api_key = Some("  ".into());
        assert!(source.api_key().is_none());
    }

    #[test]
    fn test_request_interval() {
        let crawl = CrawlConfig::default();
        assert!(crawl.request_interval(false) > crawl.request_interval(true));
    }

    #[test]
    fn test_default_build_timeout_covers_paced_default_request() {
        let crawl = CrawlConfig::default();
        let timeout = crawl.build_timeout().unwrap();

        // 200 nodes is the default request budget
        assert!(timeout >= crawl.request_interval(false) * 200);

        let disabled = CrawlConfig {
            build_timeout_secs: 0,
            ..CrawlConfig::default()
        };
        assert!(disabled.build_timeout().is_none());
    }
}
