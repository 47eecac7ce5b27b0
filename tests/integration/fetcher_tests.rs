//! HTTP fetcher behaviour against a mock server

use crate::{fetcher, mount_robots};
use robotgate::config::FetcherConfig;
use robotgate::fetcher::build_http_client;
use robotgate::{FetchError, Fetcher, HttpFetcher};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_returns_status_headers_and_body() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        ResponseTemplate::new(200)
            .set_body_string("User-agent: *\nDisallow: /private")
            .insert_header("Cache-Control", "max-age=900"),
    )
    .await;

    let response = fetcher()
        .fetch(&format!("{}/robots.txt", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.header("cache-control"), Some("max-age=900"));
    assert_eq!(response.body, b"User-agent: *\nDisallow: /private");
}

#[tokio::test]
async fn test_non_success_status_is_not_an_error() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, ResponseTemplate::new(503)).await;

    let response = fetcher()
        .fetch(&format!("{}/robots.txt", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status, 503);
}

#[tokio::test]
async fn test_sends_configured_user_agent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = FetcherConfig {
        user_agent: "TestBot/1.0".to_string(),
        ..FetcherConfig::default()
    };
    let response = HttpFetcher::from_config(&config)
        .unwrap()
        .fetch(&format!("{}/robots.txt", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_body_over_cap_is_rejected() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        ResponseTemplate::new(200).set_body_string("x".repeat(1024)),
    )
    .await;

    let client = build_http_client(&FetcherConfig::default()).unwrap();
    let url = format!("{}/robots.txt", mock_server.uri());
    let err = HttpFetcher::new(client, 100).fetch(&url).await.unwrap_err();

    assert_eq!(err, FetchError::ContentTooLong { url, limit: 100 });
}

#[tokio::test]
async fn test_body_at_cap_is_accepted() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        ResponseTemplate::new(200).set_body_string("x".repeat(100)),
    )
    .await;

    let client = build_http_client(&FetcherConfig::default()).unwrap();
    let response = HttpFetcher::new(client, 100)
        .fetch(&format!("{}/robots.txt", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(response.body.len(), 100);
}

#[tokio::test]
async fn test_redirects_followed() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        ResponseTemplate::new(301)
            .insert_header("Location", format!("{}/moved.txt", mock_server.uri()).as_str()),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/moved.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *"))
        .mount(&mock_server)
        .await;

    let response = fetcher()
        .fetch(&format!("{}/robots.txt", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"User-agent: *");
}

#[tokio::test]
async fn test_redirect_loop_is_excessive() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        ResponseTemplate::new(302)
            .insert_header("Location", format!("{}/robots.txt", mock_server.uri()).as_str()),
    )
    .await;

    let config = FetcherConfig {
        max_redirects: 3,
        ..FetcherConfig::default()
    };
    let err = HttpFetcher::from_config(&config)
        .unwrap()
        .fetch(&format!("{}/robots.txt", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ExcessiveRedirects { .. }));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        ResponseTemplate::new(200).set_delay(Duration::from_secs(3)),
    )
    .await;

    let config = FetcherConfig {
        timeout: 1,
        connect_timeout: 1,
        ..FetcherConfig::default()
    };
    let err = HttpFetcher::from_config(&config)
        .unwrap()
        .fetch(&format!("{}/robots.txt", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }));
}
