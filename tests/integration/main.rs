//! Integration tests for robotgate
//!
//! These tests use wiremock to serve robots.txt documents and exercise the
//! HTTP fetcher and the caches end-to-end.

mod cache_tests;
mod fetcher_tests;

use robotgate::config::FetcherConfig;
use robotgate::HttpFetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A fetcher with default settings
pub fn fetcher() -> HttpFetcher {
    HttpFetcher::from_config(&FetcherConfig::default()).expect("Failed to build fetcher")
}

/// Mounts a robots.txt response on the server
pub async fn mount_robots(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .mount(server)
        .await;
}
