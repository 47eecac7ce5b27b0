//! Fetcher module for robots.txt retrieval
//!
//! The rules engine and cache never talk to the network directly. They go
//! through the [`Fetcher`] trait, which performs a GET and hands back the
//! status, headers and body. [`HttpFetcher`] is the reqwest-backed
//! implementation; tests and embedders can supply their own.

mod http;

pub use http::{build_http_client, HttpFetcher};

use crate::FetchError;
use std::collections::HashMap;
use std::future::Future;

/// A retrieved robots.txt response
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, keyed by lower-cased name
    pub headers: HashMap<String, String>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Creates a response, lower-casing header names
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_lowercase(), value))
            .collect();

        Self {
            status,
            headers,
            body,
        }
    }

    /// Looks up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .map(|value| value.as_str())
    }
}

/// Performs GET requests for robots.txt documents
///
/// Implementations are responsible for their own timeouts and for enforcing
/// a cap on the body size; the cache applies neither.
pub trait Fetcher: Send + Sync + 'static {
    /// Retrieves the document at `url`
    fn fetch(&self, url: &str)
        -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}
