//! Batch scheduler runs: persistence, resume, dry run and interruption

use crate::{product_page, search_page, test_pipeline};
use part_scout::crawler::{BatchOptions, BatchScheduler};
use part_scout::input::{read_identifiers_in_chunks, InputError};
use part_scout::output::{load_prior_results, sink_for, OutputFormat};
use part_scout::ItemStatus;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a search result and a matching product page for each identifier
async fn mount_catalog(server: &MockServer, identifiers: &[&str]) {
    mount_slow_catalog(server, identifiers, Duration::ZERO).await;
}

/// Like `mount_catalog`, with every response held back by `delay`
async fn mount_slow_catalog(server: &MockServer, identifiers: &[&str], delay: Duration) {
    for identifier in identifiers {
        let product_path = format!("/product/{}", identifier.to_lowercase());
        Mock::given(method("GET"))
            .and(path("/search.php"))
            .and(query_param("search_query", *identifier))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(search_page(&product_path))
                    .set_delay(delay),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(product_path.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(product_page(identifier, "25.00"))
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }
}

fn chunks(identifiers: &[&str], chunk_size: usize) -> Vec<Result<Vec<String>, InputError>> {
    identifiers
        .chunks(chunk_size)
        .map(|chunk| Ok(chunk.iter().map(|s| s.to_string()).collect()))
        .collect()
}

fn scheduler(
    server: &MockServer,
    output: &Path,
    format: OutputFormat,
    dry_run: bool,
) -> BatchScheduler {
    BatchScheduler::new(
        test_pipeline(server, 2),
        2,
        BatchOptions {
            chunk_size: 2,
            dry_run,
        },
        sink_for(format, output),
    )
}

#[tokio::test]
async fn test_run_persists_every_result() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, &["AAA1", "BBB2", "CCC3"]).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");

    let report = scheduler(&mock_server, &output, OutputFormat::Csv, false)
        .run(
            chunks(&["AAA1", "BBB2", "bad part!", "CCC3", "NOPE9"], 2),
            std::future::pending::<()>(),
        )
        .await
        .expect("Run failed");

    assert!(!report.interrupted);
    assert!(report.summary.started_at.is_some());
    assert_eq!(report.attempted, 4);
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.success, 3);
    assert_eq!(report.results.len(), 4);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("Part Number"));
    assert!(headers.iter().any(|h| h == "Status"));
    assert!(headers.iter().any(|h| h == "In Stock"));
    assert_eq!(reader.records().count(), 4);

    let prior = load_prior_results(&output, OutputFormat::Csv).unwrap();
    let nope = prior
        .records
        .iter()
        .find(|r| r.identifier() == "NOPE9")
        .expect("NOPE9 should be in the output");
    // Unmatched search requests get wiremock's 404
    assert_eq!(nope.status(), ItemStatus::SearchFailed);
}

#[tokio::test]
async fn test_resume_skips_processed_identifiers() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, &["AAA1", "BBB2", "CCC3"]).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");

    scheduler(&mock_server, &output, OutputFormat::Csv, false)
        .run(chunks(&["AAA1", "BBB2"], 2), std::future::pending::<()>())
        .await
        .expect("First run failed");
    let requests_after_first = mock_server.received_requests().await.unwrap().len();
    assert_eq!(requests_after_first, 4);

    let prior = load_prior_results(&output, OutputFormat::Csv).unwrap();
    assert_eq!(prior.len(), 2);

    let report = scheduler(&mock_server, &output, OutputFormat::Csv, false)
        .with_prior_results(prior)
        .run(
            chunks(&["AAA1", "BBB2", "CCC3"], 2),
            std::future::pending::<()>(),
        )
        .await
        .expect("Resumed run failed");

    // Only CCC3 is fetched again
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), requests_after_first + 2);
    assert_eq!(report.skipped_processed, 2);
    assert_eq!(report.attempted, 1);
    assert_eq!(report.summary.total, 1);

    let identifiers: Vec<String> = report
        .results
        .iter()
        .map(|r| r.identifier().to_string())
        .collect();
    assert_eq!(identifiers, vec!["AAA1", "BBB2", "CCC3"]);

    let reloaded = load_prior_results(&output, OutputFormat::Csv).unwrap();
    assert_eq!(reloaded.len(), 3);
}

#[tokio::test]
async fn test_resume_retries_fetch_errors() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.json");

    // Everything is rate limited during the first run
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_catalog(&mock_server, &["AAA1"]).await;

    let first = scheduler(&mock_server, &output, OutputFormat::Json, false)
        .run(chunks(&["AAA1"], 2), std::future::pending::<()>())
        .await
        .unwrap();
    assert_eq!(first.results[0].status(), ItemStatus::FetchError);

    let prior = load_prior_results(&output, OutputFormat::Json).unwrap();
    assert!(prior.is_empty());

    let second = scheduler(&mock_server, &output, OutputFormat::Json, false)
        .with_prior_results(prior)
        .run(chunks(&["AAA1"], 2), std::future::pending::<()>())
        .await
        .unwrap();
    assert_eq!(second.results.len(), 1);
    assert_eq!(second.results[0].status(), ItemStatus::Success);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json[0]["Part Number"], "AAA1");
    assert_eq!(json[0]["Status"], "Success");
    assert_eq!(json[0]["Price"], "25.00");
}

#[tokio::test]
async fn test_dry_run_never_writes() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, &["AAA1"]).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");

    let report = scheduler(&mock_server, &output, OutputFormat::Csv, true)
        .run(chunks(&["AAA1"], 2), std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.summary.success, 1);
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_shutdown_saves_and_stops() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, &["AAA1", "BBB2"]).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");

    // Shutdown is already requested when the first chunk starts, so the
    // first completion is never collected
    let report = scheduler(&mock_server, &output, OutputFormat::Csv, false)
        .run(chunks(&["AAA1", "BBB2"], 1), async {})
        .await
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.attempted, 1);
    assert!(report.results.is_empty());

    let mut reader = csv::Reader::from_path(&output).unwrap();
    assert_eq!(reader.headers().unwrap().get(0), Some("Part Number"));
    assert_eq!(reader.records().count(), 0);
}

#[tokio::test]
async fn test_concurrency_limit_bounds_items_in_flight() {
    let identifiers = ["AAA1", "BBB2", "CCC3", "DDD4", "EEE5", "FFF6"];
    let mock_server = MockServer::start().await;
    mount_slow_catalog(&mock_server, &identifiers, Duration::from_millis(200)).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");

    // One chunk, two permits: six items of two 200ms requests each need
    // three rounds
    let scheduler = BatchScheduler::new(
        test_pipeline(&mock_server, 2),
        2,
        BatchOptions {
            chunk_size: 10,
            dry_run: false,
        },
        sink_for(OutputFormat::Csv, &output),
    );

    let started = Instant::now();
    let report = scheduler
        .run(chunks(&identifiers, 10), std::future::pending::<()>())
        .await
        .unwrap();

    assert_eq!(report.summary.success, 6);
    assert!(started.elapsed() >= Duration::from_millis(1200));
}

#[tokio::test]
async fn test_shutdown_mid_chunk_saves_completed_items() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, &["AAA1"]).await;
    mount_slow_catalog(&mock_server, &["BBB2"], Duration::from_secs(3)).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results.csv");

    let scheduler = BatchScheduler::new(
        test_pipeline(&mock_server, 2),
        2,
        BatchOptions {
            chunk_size: 10,
            dry_run: false,
        },
        sink_for(OutputFormat::Csv, &output),
    );

    let started = Instant::now();
    let report = scheduler
        .run(
            chunks(&["AAA1", "BBB2"], 10),
            tokio::time::sleep(Duration::from_millis(800)),
        )
        .await
        .unwrap();

    assert!(report.interrupted);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].identifier(), "AAA1");

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(0), Some("AAA1"));
}

#[tokio::test]
async fn test_run_from_input_file() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server, &["AAA1", "BBB2", "CCC3"]).await;
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("parts.csv");
    let output = dir.path().join("results.csv");
    fs::write(&input, "Part Number\nAAA1\n  BBB2  \n\nCCC3,extra\nAAA1\n").unwrap();

    let source = read_identifiers_in_chunks(&input, 2).unwrap();
    let report = scheduler(&mock_server, &output, OutputFormat::Csv, false)
        .run(source, std::future::pending::<()>())
        .await
        .unwrap();

    // The header row fails the shape check; the repeated AAA1 is skipped
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.skipped_processed, 1);
    assert_eq!(report.summary.success, 3);
    assert_eq!(report.results.len(), 3);
}
