//! HTTP fetcher implementation
//!
//! This module handles robots.txt retrieval over HTTP, including:
//! - Building HTTP clients with proper user agent strings
//! - Bounded redirect following
//! - Streaming the body with a hard size cap
//! - Error classification into the fetch error taxonomy

use crate::config::FetcherConfig;
use crate::fetcher::{FetchResponse, Fetcher};
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use robotgate::config::FetcherConfig;
/// use robotgate::fetcher::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout))
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches robots.txt documents with reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_size: usize,
}

impl HttpFetcher {
    /// Wraps an existing client, capping bodies at `max_body_size` bytes
    pub fn new(client: Client, max_body_size: usize) -> Self {
        Self {
            client,
            max_body_size,
        }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?, config.max_body_size))
    }

    /// The body size cap in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::MalformedUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();

        // Repeated headers are folded into one comma-separated value
        let mut headers: HashMap<String, String> = HashMap::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else {
                continue;
            };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| classify_error(url, e))? {
            if body.len() + chunk.len() > self.max_body_size {
                return Err(FetchError::ContentTooLong {
                    url: url.to_string(),
                    limit: self.max_body_size,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("Fetched {} ({}, {} bytes)", url, status, body.len());
        Ok(FetchResponse::new(status, headers, body))
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
///
/// | Condition | Error |
/// |-----------|-------|
/// | Timeout | `Timeout` |
/// | Redirect limit | `ExcessiveRedirects` |
/// | Request could not be built | `MalformedUrl` |
/// | TLS/certificate failure | `Tls` |
/// | Connection refused, DNS | `Connection` |
/// | Body read or decode failure | `Body` |
fn classify_error(url: &str, err: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if err.is_timeout() {
        FetchError::Timeout { url }
    } else if err.is_redirect() {
        FetchError::ExcessiveRedirects { url }
    } else if err.is_builder() {
        FetchError::MalformedUrl {
            url,
            message: err.to_string(),
        }
    } else if err.is_connect() && is_tls_failure(&err) {
        FetchError::Tls {
            url,
            message: error_chain(&err),
        }
    } else if err.is_body() || err.is_decode() {
        FetchError::Body {
            url,
            message: error_chain(&err),
        }
    } else {
        FetchError::Connection {
            url,
            message: error_chain(&err),
        }
    }
}

/// Renders an error with all of its sources
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let message = error_chain(err).to_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|needle| message.contains(needle))
}
