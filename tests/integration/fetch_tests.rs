//! Fetcher behaviour against a live mock server

use crate::{test_fetcher, test_settings};
use part_scout::config::{ProxySettings, ScraperSettings};
use part_scout::crawler::{build_http_client, Fetcher};
use part_scout::logging::SecretMask;
use part_scout::ScoutError;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_passes_query_params() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.php"))
        .and(query_param("search_query", "ABC-123/4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("results"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(3);
    let url = format!("{}/search.php", mock_server.uri());
    let response = fetcher
        .fetch(&url, &[("search_query", "ABC-123/4")])
        .await
        .expect("Fetch failed");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "results");
    assert!(response.is_usable());
}

#[tokio::test]
async fn test_retry_after_is_honoured() {
    let mock_server = MockServer::start().await;

    // First request is rate limited, the next one succeeds
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(3);
    let started = Instant::now();
    let response = fetcher
        .fetch(&format!("{}/p", mock_server.uri()), &[])
        .await
        .expect("Fetch failed");

    assert_eq!(response.status, 200);
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_consecutive_rate_limits_wait_for_each_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(3);
    let started = Instant::now();
    let response = fetcher
        .fetch(&format!("{}/p", mock_server.uri()), &[])
        .await
        .expect("Fetch failed");

    assert_eq!(response.status, 200);
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

/// A fetcher with the given polite delay and a short backoff unit
fn polite_fetcher(max_retries: u32, request_delay_ms: u64) -> Fetcher {
    let settings = ScraperSettings {
        request_delay_ms,
        ..test_settings(max_retries)
    };
    let client = build_http_client(&settings, &ProxySettings::default()).unwrap();
    Fetcher::new(client, &settings, SecretMask::default())
        .with_backoff_unit(Duration::from_millis(10))
}

#[tokio::test]
async fn test_polite_delay_follows_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let fetcher = polite_fetcher(3, 300);
    let started = Instant::now();
    fetcher
        .fetch(&format!("{}/p", mock_server.uri()), &[])
        .await
        .expect("Fetch failed");

    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_polite_delay_skipped_for_rate_limited_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = polite_fetcher(3, 1500);
    let started = Instant::now();
    let result = fetcher
        .fetch(&format!("{}/p", mock_server.uri()), &[])
        .await;

    assert!(matches!(result, Err(ScoutError::Fetch(ref e)) if e.attempts == 3));
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_polite_delay_applied_once_after_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let fetcher = polite_fetcher(3, 1000);
    let started = Instant::now();
    let response = fetcher
        .fetch(&format!("{}/p", mock_server.uri()), &[])
        .await
        .expect("Fetch failed");

    let elapsed = started.elapsed();
    assert_eq!(response.status, 200);
    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed < Duration::from_millis(2000));
}

#[tokio::test]
async fn test_unusable_retry_after_falls_back_to_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", ""))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    // Default backoff unit: the first wait is at least one second
    let settings = test_settings(3);
    let client = build_http_client(&settings, &ProxySettings::default()).unwrap();
    let fetcher = Fetcher::new(client, &settings, SecretMask::default());

    let started = Instant::now();
    let response = fetcher
        .fetch(&format!("{}/p", mock_server.uri()), &[])
        .await
        .expect("Fetch failed");

    assert_eq!(response.status, 200);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_persistent_rate_limit_exhausts_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(3);
    let url = format!("{}/p", mock_server.uri());
    let result = fetcher.fetch(&url, &[]).await;

    match result {
        Err(ScoutError::Fetch(e)) => {
            assert_eq!(e.attempts, 3);
            assert_eq!(e.url, url);
            assert_eq!(
                e.to_string(),
                format!("Failed to fetch {} after 3 attempts.", url)
            );
        }
        other => panic!("Expected a fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = test_fetcher(3);
    let response = fetcher
        .fetch(&format!("{}/p", mock_server.uri()), &[])
        .await
        .expect("A 500 is a response, not an error");

    assert_eq!(response.status, 500);
    assert_eq!(response.body, "boom");
    assert!(!response.is_usable());
}

#[tokio::test]
async fn test_connection_refused_exhausts_attempts() {
    // Nothing listens on port 1
    let url = "http://127.0.0.1:1/p";

    let fetcher = test_fetcher(2);
    let result = fetcher.fetch(url, &[]).await;

    assert!(matches!(result, Err(ScoutError::Fetch(ref e)) if e.attempts == 2));
}
