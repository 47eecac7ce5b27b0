//! Robotgate: a robots.txt rules engine with an expiring per-host cache
//!
//! This crate parses robot exclusion documents into queryable rule sets,
//! answers allowed/delay/sitemap questions for crawler identities, and keeps
//! one rule set per host in a bounded, TTL-driven cache that refreshes itself
//! when entries expire.

pub mod cache;
pub mod config;
pub mod fetcher;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for robots.txt lookups
///
/// Cloneable so that a failed lookup can be cached and handed back to every
/// caller until the entry is refreshed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RobotsError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Structural errors in a robots.txt document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Line {line}: directive \"{directive}\" must be preceded by a User-agent line")]
    DirectiveBeforeUserAgent { line: usize, directive: String },
}

/// Errors raised while retrieving a robots.txt document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Connection error for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("TLS error for {url}: {message}")]
    Tls { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Malformed URL {url}: {message}")]
    MalformedUrl { url: String, message: String },

    #[error("Too many redirects from {url}")]
    ExcessiveRedirects { url: String },

    #[error("Remote server returned {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Unexpected status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Content of {url} larger than {limit} bytes")]
    ContentTooLong { url: String, limit: usize },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("Failed to parse URL {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

impl From<UrlError> for FetchError {
    fn from(err: UrlError) -> Self {
        let url = match &err {
            UrlError::Parse { url, .. } => url.clone(),
            UrlError::InvalidScheme(url) | UrlError::MissingHost(url) => url.clone(),
        };
        FetchError::MalformedUrl {
            url,
            message: err.to_string(),
        }
    }
}

impl From<UrlError> for RobotsError {
    fn from(err: UrlError) -> Self {
        RobotsError::Fetch(err.into())
    }
}

/// Result type alias for robots.txt lookups
pub type Result<T> = std::result::Result<T, RobotsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::{
    AgentCache, CacheBuilder, CachePolicy, DefaultObjectPolicy, ExpiringEntry,
    HeaderWithDefaultPolicy, ReraiseExceptionPolicy, RobotsCache, TtlPolicy,
};
pub use config::Config;
pub use fetcher::{FetchResponse, Fetcher, HttpFetcher};
pub use robots::{Agent, Directive, RuleSet};
pub use crate::url::{extract_path, robots_url, sanitize_path};
