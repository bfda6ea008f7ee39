//! Integration tests for Part-Scout
//!
//! These tests use wiremock to stand in for a vendor website and drive the
//! fetcher, the item pipeline and the batch scheduler end-to-end.

mod fetch_tests;
mod pipeline_tests;
mod scheduler_tests;

use part_scout::config::{ProxySettings, ScraperSettings};
use part_scout::crawler::{build_http_client, Fetcher, ItemPipeline};
use part_scout::logging::SecretMask;
use part_scout::site::builtin;
use part_scout::SiteConfig;
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

/// Scraper settings with no polite delay
pub fn test_settings(max_retries: u32) -> ScraperSettings {
    ScraperSettings {
        max_retries,
        request_delay_ms: 0,
        timeout_secs: 5,
        connect_timeout_secs: 5,
        ..ScraperSettings::default()
    }
}

/// Creates a fetcher with a short backoff unit
pub fn test_fetcher(max_retries: u32) -> Fetcher {
    let settings = test_settings(max_retries);
    let client = build_http_client(&settings, &ProxySettings::default())
        .expect("Failed to build HTTP client");
    Fetcher::new(client, &settings, SecretMask::default())
        .with_backoff_unit(Duration::from_millis(10))
}

/// The built-in G2S site, pointed at the mock server
pub fn mock_site(server: &MockServer) -> SiteConfig {
    let mut definition = builtin::g2s();
    definition.base_url = server.uri();
    SiteConfig::from_definition(definition).expect("Failed to compile site")
}

pub fn test_pipeline(server: &MockServer, max_retries: u32) -> ItemPipeline {
    ItemPipeline::new(
        Arc::new(test_fetcher(max_retries)),
        Arc::new(mock_site(server)),
        SecretMask::default(),
    )
}

/// A search results page linking to one product
pub fn search_page(href: &str) -> String {
    format!(
        r#"<html><body>
            <ul class="productGrid">
                <li><a data-event-type="product-click" href="{href}">Result</a></li>
            </ul>
        </body></html>"#
    )
}

/// A product page showing the given title as heading and SKU
pub fn product_page(title: &str, price: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
            <div class="productView" data-product-price="{price}">
                <h1 class="productView-title">{title}</h1>
                <div class="productView-sku"><span>{title}</span></div>
                <dl>
                    <dt>stock-montreal:</dt><dd>10</dd>
                    <dt>stock-mississauga:</dt><dd>0</dd>
                    <dt>stock-edmonton:</dt><dd>3</dd>
                    <dt>Special Order Items:</dt><dd> Yes </dd>
                </dl>
            </div>
        </body></html>"#
    )
}
