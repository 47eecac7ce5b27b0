//! End-to-end cache behaviour: status mapping, TTLs and failure policies

use crate::{fetcher, mount_robots};
use robotgate::cache::{DefaultObjectPolicy, HeaderWithDefaultPolicy};
use robotgate::config::{parse_config, OnError};
use robotgate::robots::fetch_rules;
use robotgate::{AgentCache, FetchError, RobotsCache, RobotsError, RuleSet};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROBOTS: &str = "\
# robots.txt for a test site
User-agent: *
Disallow: /private*/
Disallow: /tmp
Crawl-delay: 1.5

User-agent: TestBot
User-agent: OtherBot
Disallow: /
Allow: /open

Sitemap: http://example.com/sitemap-1.xml
Sitemap: http://example.com/sitemap-2.xml
";

async fn serve(template: ResponseTemplate, expected_fetches: u64) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(template)
        .expect(expected_fetches)
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test]
async fn test_rules_applied_end_to_end() {
    let mock_server = serve(ResponseTemplate::new(200).set_body_string(ROBOTS), 1).await;
    let base = mock_server.uri();
    let cache = RobotsCache::new(fetcher(), 100);

    assert!(cache.allowed(&format!("{}/public", base), "bot").await.unwrap());
    assert!(!cache.allowed(&format!("{}/private-stuff/x", base), "bot").await.unwrap());
    assert!(cache.allowed(&format!("{}/private", base), "bot").await.unwrap());
    assert!(!cache.allowed(&format!("{}/tmp/file", base), "bot").await.unwrap());

    assert!(cache.allowed(&format!("{}/open/page", base), "testbot").await.unwrap());
    assert!(!cache.allowed(&format!("{}/public", base), "OtherBot/2.0").await.unwrap());
    assert!(cache.allowed(&format!("{}/robots.txt", base), "testbot").await.unwrap());
}

#[tokio::test]
async fn test_delay_sitemaps_and_batches() {
    let mock_server = serve(ResponseTemplate::new(200).set_body_string(ROBOTS), 1).await;
    let base = mock_server.uri();
    let cache = RobotsCache::new(fetcher(), 100);

    assert_eq!(cache.delay(&base, "bot").await.unwrap(), Some(1.5));
    assert_eq!(cache.delay(&base, "testbot").await.unwrap(), None);
    assert_eq!(
        cache.sitemaps(&base).await.unwrap(),
        vec![
            "http://example.com/sitemap-1.xml",
            "http://example.com/sitemap-2.xml"
        ]
    );

    let urls: Vec<String> = ["/a", "/tmp/b", "/c", "/private1/d"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();
    assert_eq!(
        cache.allowed_many(&urls, "bot").await.unwrap(),
        vec![urls[0].clone(), urls[2].clone()]
    );
    assert_eq!(
        cache.disallowed_many(&urls, "bot").await.unwrap(),
        vec![urls[1].clone(), urls[3].clone()]
    );
}

#[tokio::test]
async fn test_forbidden_disallows_everything() {
    let mock_server = serve(ResponseTemplate::new(403), 1).await;
    let cache = RobotsCache::new(fetcher(), 100);

    assert!(cache
        .disallowed(&format!("{}/page", mock_server.uri()), "bot")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unauthorized_allowed_when_configured() {
    let mock_server = serve(ResponseTemplate::new(401), 1).await;
    let cache = RobotsCache::builder(fetcher())
        .disallow_forbidden(false)
        .build();

    assert!(cache
        .allowed(&format!("{}/page", mock_server.uri()), "bot")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_not_found_allows_everything() {
    let mock_server = serve(ResponseTemplate::new(404), 1).await;
    let cache = RobotsCache::new(fetcher(), 100);

    assert!(cache
        .allowed(&format!("{}/anything", mock_server.uri()), "bot")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_server_error_reraised() {
    let mock_server = serve(ResponseTemplate::new(500), 1).await;
    let cache = RobotsCache::builder(fetcher())
        .on_error(OnError::Reraise)
        .build();
    let url = format!("{}/page", mock_server.uri());

    let err = cache.get(&url).await.unwrap_err();
    assert!(matches!(
        err,
        RobotsError::Fetch(FetchError::BadStatus { status: 500, .. })
    ));
    // The error is cached, so the server sees one request
    assert_eq!(cache.get(&url).await.unwrap_err(), err);
}

#[tokio::test]
async fn test_server_error_disallows_by_default() {
    let mock_server = serve(ResponseTemplate::new(500), 1).await;
    let cache = RobotsCache::new(fetcher(), 100);

    assert!(cache
        .disallowed(&format!("{}/page", mock_server.uri()), "bot")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_malformed_document_goes_through_policy() {
    let mock_server = serve(
        ResponseTemplate::new(200).set_body_string("Disallow: /\nUser-agent: *"),
        1,
    )
    .await;
    let cache = RobotsCache::builder(fetcher())
        .build_with_policy(Arc::new(DefaultObjectPolicy::<Arc<RuleSet>>::allow_all(
            Duration::from_secs(60),
        )));

    assert!(cache
        .allowed(&format!("{}/page", mock_server.uri()), "bot")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unreachable_host_uses_policy() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let url = format!("http://127.0.0.1:{}/page", port);

    let lenient = RobotsCache::builder(fetcher())
        .on_error(OnError::AllowAll)
        .build();
    assert!(lenient.allowed(&url, "bot").await.unwrap());

    let strict = RobotsCache::builder(fetcher())
        .on_error(OnError::Reraise)
        .build();
    assert!(matches!(
        strict.allowed(&url, "bot").await.unwrap_err(),
        RobotsError::Fetch(FetchError::Connection { .. })
    ));
}

#[tokio::test]
async fn test_max_age_keeps_entry_fresh() {
    let mock_server = serve(
        ResponseTemplate::new(200)
            .set_body_string(ROBOTS)
            .insert_header("Cache-Control", "max-age=3600"),
        1,
    )
    .await;
    let cache = RobotsCache::new(fetcher(), 100);

    let rules = cache.get(&mock_server.uri()).await.unwrap();
    assert!(rules.ttl() > Duration::from_secs(3500));
    assert!(!rules.is_expired());
    cache.get(&mock_server.uri()).await.unwrap();
}

#[tokio::test]
async fn test_no_store_refetches() {
    let mock_server = serve(
        ResponseTemplate::new(200)
            .set_body_string(ROBOTS)
            .insert_header("Cache-Control", "no-store"),
        2,
    )
    .await;
    let cache = RobotsCache::builder(fetcher())
        .ttl_policy(HeaderWithDefaultPolicy::new(Duration::from_secs(60), Duration::ZERO))
        .build();

    cache.get(&mock_server.uri()).await.unwrap();
    cache.get(&mock_server.uri()).await.unwrap();
}

#[tokio::test]
async fn test_refresh_refetches() {
    let mock_server = serve(ResponseTemplate::new(200).set_body_string(ROBOTS), 2).await;
    let cache = RobotsCache::new(fetcher(), 100);

    cache.get(&mock_server.uri()).await.unwrap();
    cache.refresh(&mock_server.uri()).await.unwrap();
    cache.get(&mock_server.uri()).await.unwrap();
}

#[tokio::test]
async fn test_eviction_refetches() {
    let first = serve(ResponseTemplate::new(200).set_body_string(ROBOTS), 2).await;
    let second = serve(ResponseTemplate::new(200).set_body_string(ROBOTS), 1).await;
    let cache = RobotsCache::new(fetcher(), 1);

    cache.get(&first.uri()).await.unwrap();
    cache.get(&second.uri()).await.unwrap();
    assert_eq!(cache.len(), 1);
    assert!(!cache.contains(&first.uri()));

    cache.get(&first.uri()).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_share_one_fetch() {
    let mock_server = serve(
        ResponseTemplate::new(200)
            .set_body_string(ROBOTS)
            .set_delay(Duration::from_millis(200)),
        1,
    )
    .await;
    let cache = Arc::new(RobotsCache::new(fetcher(), 100));
    let base = mock_server.uri();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let cache = cache.clone();
            let url = format!("{}/page/{}", base, i);
            tokio::spawn(async move { cache.allowed(&url, "bot").await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }
}

#[tokio::test]
async fn test_agent_cache_end_to_end() {
    let mock_server = serve(ResponseTemplate::new(200).set_body_string(ROBOTS), 1).await;
    let base = mock_server.uri();
    let cache = AgentCache::new(fetcher(), "TestBot", 100);

    assert!(cache.allowed(&format!("{}/open", base)).await.unwrap());
    assert!(cache.disallowed(&format!("{}/closed", base)).await.unwrap());
    assert_eq!(cache.delay(&base).await.unwrap(), None);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_agent_cache_from_config() {
    let config = parse_config(
        r#"
[cache]
capacity = 10
on-error = "allow-all"
"#,
    )
    .unwrap();
    let mock_server = serve(ResponseTemplate::new(503), 1).await;
    let cache = AgentCache::from_config(fetcher(), "bot", &config.cache);

    assert!(cache
        .allowed(&format!("{}/page", mock_server.uri()))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_fetch_rules_without_cache() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        ResponseTemplate::new(200)
            .set_body_string(ROBOTS)
            .insert_header("Expires", "Thu, 01 Jan 1970 00:00:00 GMT"),
    )
    .await;

    let policy = HeaderWithDefaultPolicy::new(Duration::from_secs(60), Duration::from_secs(30));
    let url = format!("{}/robots.txt", mock_server.uri());
    let rules = fetch_rules(&fetcher(), &url, &policy, true).await.unwrap();

    assert_eq!(rules.url(), url);
    assert_eq!(rules.delay("bot"), Some(1.5));
    // An Expires in the past is clamped to the minimum TTL
    assert!(rules.ttl() <= Duration::from_secs(30));
    assert!(rules.ttl() > Duration::from_secs(20));
}
