//! Item pipeline scenarios against a mock vendor site

use crate::{product_page, search_page, test_pipeline};
use part_scout::ItemStatus;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts a search endpoint answering `identifier` with the given response
async fn mount_search(server: &MockServer, identifier: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/search.php"))
        .and(query_param("search_query", identifier))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_product(server: &MockServer, product_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(product_path))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_exact_match_extracts_every_field() {
    let mock_server = MockServer::start().await;
    mount_search(
        &mock_server,
        "ABC123",
        ResponseTemplate::new(200).set_body_string(search_page("/product/abc-123")),
    )
    .await;
    mount_product(
        &mock_server,
        "/product/abc-123",
        ResponseTemplate::new(200).set_body_string(product_page("ABC-123", "$1,299.50")),
    )
    .await;

    let record = test_pipeline(&mock_server, 3).process("ABC123").await;

    assert_eq!(record.status(), ItemStatus::Success);
    assert_eq!(record.get("Part Number"), Some("ABC123"));
    assert_eq!(record.get("Status"), Some("Success"));
    assert_eq!(record.get("Status Code"), Some("200"));
    assert_eq!(record.get("Exists"), Some("Yes"));
    assert_eq!(record.get("Price"), Some("1299.50"));
    assert_eq!(record.get("Montreal"), Some("10"));
    assert_eq!(record.get("Mississauga"), Some("0"));
    assert_eq!(record.get("Edmonton"), Some("3"));
    assert_eq!(record.get("In Stock"), Some("Montreal, Edmonton"));
    assert_eq!(record.get("Special Order Items"), Some("Yes"));
    assert_eq!(record.get("Dropship Item"), Some("Not found"));
    assert_eq!(record.get("Error"), None);
}

#[tokio::test]
async fn test_invalid_identifier_makes_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let record = test_pipeline(&mock_server, 3).process("bad part!").await;

    assert_eq!(record.status(), ItemStatus::InvalidPartNumber);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_error_status_is_recorded() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "ABC123", ResponseTemplate::new(500)).await;

    let record = test_pipeline(&mock_server, 3).process("ABC123").await;

    assert_eq!(record.status(), ItemStatus::SearchFailed);
    assert_eq!(record.get("Status Code"), Some("500"));
    assert_eq!(record.get("Exists"), None);
}

#[tokio::test]
async fn test_empty_search_body_fails_search() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "ABC123", ResponseTemplate::new(200)).await;

    let record = test_pipeline(&mock_server, 3).process("ABC123").await;

    assert_eq!(record.status(), ItemStatus::SearchFailed);
    assert_eq!(record.get("Status Code"), Some("200"));
}

#[tokio::test]
async fn test_no_product_link_is_not_found() {
    let mock_server = MockServer::start().await;
    mount_search(
        &mock_server,
        "ZZZ999",
        ResponseTemplate::new(200)
            .set_body_string("<html><body><p>No products found</p></body></html>"),
    )
    .await;

    let record = test_pipeline(&mock_server, 3).process("ZZZ999").await;

    assert_eq!(record.status(), ItemStatus::NotFound);
    assert_eq!(record.get("Status Code"), Some("200"));
}

#[tokio::test]
async fn test_empty_product_link_is_reported() {
    let mock_server = MockServer::start().await;
    mount_search(
        &mock_server,
        "ABC123",
        ResponseTemplate::new(200).set_body_string(search_page("")),
    )
    .await;

    let record = test_pipeline(&mock_server, 3).process("ABC123").await;

    assert_eq!(record.status(), ItemStatus::ProductUrlNotFound);
}

#[tokio::test]
async fn test_product_page_error_is_recorded() {
    let mock_server = MockServer::start().await;
    mount_search(
        &mock_server,
        "ABC123",
        ResponseTemplate::new(200).set_body_string(search_page("product/abc-123")),
    )
    .await;
    mount_product(&mock_server, "/product/abc-123", ResponseTemplate::new(404)).await;

    let record = test_pipeline(&mock_server, 3).process("ABC123").await;

    assert_eq!(record.status(), ItemStatus::ProductFetchFailed);
    assert_eq!(record.get("Status Code"), Some("404"));
}

#[tokio::test]
async fn test_different_product_is_no_exact_match() {
    let mock_server = MockServer::start().await;
    mount_search(
        &mock_server,
        "ABC123",
        ResponseTemplate::new(200).set_body_string(search_page("/product/abc-1234")),
    )
    .await;
    mount_product(
        &mock_server,
        "/product/abc-1234",
        ResponseTemplate::new(200).set_body_string(product_page("ABC-1234", "10.00")),
    )
    .await;

    let record = test_pipeline(&mock_server, 3).process("ABC123").await;

    assert_eq!(record.status(), ItemStatus::NoExactMatch);
    assert_eq!(record.get("Exists"), Some("No"));
    assert_eq!(record.get("Price"), None);
}

#[tokio::test]
async fn test_missing_price_is_price_not_found() {
    let mock_server = MockServer::start().await;
    mount_search(
        &mock_server,
        "ABC123",
        ResponseTemplate::new(200).set_body_string(search_page("/product/abc-123")),
    )
    .await;
    mount_product(
        &mock_server,
        "/product/abc-123",
        ResponseTemplate::new(200).set_body_string(product_page("ABC123", "")),
    )
    .await;

    let record = test_pipeline(&mock_server, 3).process("ABC123").await;

    assert_eq!(record.status(), ItemStatus::PriceNotFound);
    assert_eq!(record.get("Exists"), Some("Yes"));
    assert_eq!(record.get("In Stock"), Some("Montreal, Edmonton"));
}

#[tokio::test]
async fn test_rate_limited_search_is_fetch_error() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server, "ABC123", ResponseTemplate::new(429)).await;

    let record = test_pipeline(&mock_server, 2).process("ABC123").await;

    assert_eq!(record.status(), ItemStatus::FetchError);
    let error = record.get("Error").expect("Error column should be set");
    assert!(error.starts_with("Failed to fetch"));
    assert!(error.ends_with("after 2 attempts."));
}
