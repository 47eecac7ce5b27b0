use serde::Deserialize;

/// Main configuration structure for Robotgate
///
/// Every section and field has a default, so an empty file is a valid
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub fetcher: FetcherConfig,
}

/// Cache behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of hosts kept before least-recently-used eviction
    pub capacity: usize,

    /// TTL when the response headers give no caching hints (seconds)
    #[serde(rename = "default-ttl")]
    pub default_ttl: u64,

    /// Floor applied to every header-derived TTL (seconds)
    #[serde(rename = "minimum-ttl")]
    pub minimum_ttl: u64,

    /// How long a failed fetch is remembered before the host is re-probed (seconds)
    #[serde(rename = "error-ttl")]
    pub error_ttl: u64,

    /// What to serve while a host's robots.txt cannot be fetched
    #[serde(rename = "on-error")]
    pub on_error: OnError,

    /// Whether 401/403 responses disallow everything (otherwise allow everything)
    #[serde(rename = "disallow-forbidden")]
    pub disallow_forbidden: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            default_ttl: 3600,
            minimum_ttl: 600,
            error_ttl: 600,
            on_error: OnError::AllowNone,
            disallow_forbidden: true,
        }
    }
}

/// Failure handling for hosts whose robots.txt cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnError {
    /// Treat the host as disallowing everything
    #[default]
    AllowNone,
    /// Treat the host as allowing everything
    AllowAll,
    /// Return the fetch error to every caller
    Reraise,
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout (seconds)
    pub timeout: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Maximum number of redirects followed
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Largest accepted robots.txt body (bytes)
    #[serde(rename = "max-body-size")]
    pub max_body_size: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("robotgate/{}", env!("CARGO_PKG_VERSION")),
            timeout: 30,
            connect_timeout: 10,
            max_redirects: 10,
            max_body_size: 1_048_576,
        }
    }
}
