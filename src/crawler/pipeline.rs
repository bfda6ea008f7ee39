//! Item pipeline: search, product fetch, match check, extraction
//!
//! [`ItemPipeline::process`] drives one identifier to a terminal status and
//! always returns a [`ResultRecord`]; per-item failures are encoded in the
//! record's status and `Error` column, never returned as errors.
//!
//! HTML documents are parsed and dropped inside synchronous helpers so that
//! no document is held across an await point.

use crate::crawler::extract::extract_field;
use crate::crawler::fetcher::{FetchResponse, Fetcher};
use crate::crawler::matcher::{is_exact_match, page_title};
use crate::logging::SecretMask;
use crate::site::SiteConfig;
use crate::state::{
    ItemStatus, ResultRecord, Stage, DEFAULT_VALUE, ERROR_COLUMN, EXISTS_COLUMN, IN_STOCK_COLUMN,
    STATUS_CODE_COLUMN,
};
use crate::ScoutError;
use scraper::Html;
use std::sync::Arc;

/// Processes identifiers against one site
#[derive(Debug, Clone)]
pub struct ItemPipeline {
    fetcher: Arc<Fetcher>,
    site: Arc<SiteConfig>,
    mask: SecretMask,
}

/// What the search results page says about the product link
#[derive(Debug, Clone, PartialEq)]
enum ProductLink {
    /// No element matched the product link selector
    Missing,
    /// The element exists but the link attribute is absent or empty
    Empty,
    Found(String),
}

impl ItemPipeline {
    pub fn new(fetcher: Arc<Fetcher>, site: Arc<SiteConfig>, mask: SecretMask) -> Self {
        Self {
            fetcher,
            site,
            mask,
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Processes one identifier to a terminal status
    pub async fn process(&self, identifier: &str) -> ResultRecord {
        let mut record = ResultRecord::new(identifier);

        match self.run(identifier, &mut record).await {
            Ok(status) => record.set_status(status),
            Err(ScoutError::Fetch(e)) => {
                record.set_status(ItemStatus::FetchError);
                record.set(ERROR_COLUMN, self.mask.mask(&e.to_string()));
            }
            Err(e) => {
                let message = self.mask.mask(&e.to_string());
                tracing::warn!("Error processing {}: {}", identifier, message);
                record.set_status(ItemStatus::Error);
                record.set(ERROR_COLUMN, message);
            }
        }

        tracing::debug!("{} -> {}", identifier, record.status());
        record
    }

    async fn run(
        &self,
        identifier: &str,
        record: &mut ResultRecord,
    ) -> Result<ItemStatus, ScoutError> {
        let site = self.site.as_ref();

        trace_stage(identifier, Stage::Validating);
        if !site.accepts(identifier) {
            return Ok(ItemStatus::InvalidPartNumber);
        }

        trace_stage(identifier, Stage::Searching);
        let search = self
            .fetcher
            .fetch(
                &site.search_url(),
                &[(site.search_param_name.as_str(), identifier)],
            )
            .await?;
        if !search.is_usable() {
            record_status_code(record, &search);
            return Ok(ItemStatus::SearchFailed);
        }

        let product_url = match find_product_link(&search.body, site) {
            ProductLink::Missing => {
                record_status_code(record, &search);
                return Ok(ItemStatus::NotFound);
            }
            ProductLink::Empty => {
                record_status_code(record, &search);
                return Ok(ItemStatus::ProductUrlNotFound);
            }
            ProductLink::Found(href) => resolve_product_url(&site.base_url, &href),
        };

        trace_stage(identifier, Stage::ProductFetching);
        let product = self.fetcher.fetch(&product_url, &[]).await?;
        record_status_code(record, &product);
        if !product.is_usable() {
            return Ok(ItemStatus::ProductFetchFailed);
        }

        Ok(evaluate_product(identifier, &product.body, site, record))
    }
}

fn trace_stage(identifier: &str, stage: Stage) {
    tracing::trace!(identifier, ?stage, "pipeline stage");
}

fn record_status_code(record: &mut ResultRecord, response: &FetchResponse) {
    record.set(STATUS_CODE_COLUMN, response.status.to_string());
}

/// Locates the product link on a search results page
fn find_product_link(body: &str, site: &SiteConfig) -> ProductLink {
    let document = Html::parse_document(body);
    match site.product_link.first(&document) {
        None => ProductLink::Missing,
        Some(element) => match element.value().attr(&site.product_link_attribute) {
            Some("") | None => ProductLink::Empty,
            Some(href) => ProductLink::Found(href.to_string()),
        },
    }
}

/// Resolves a product link against the site's base URL
///
/// Paths starting with `/` are appended to the base URL, anything else not
/// starting with `http` gets a `/` in between, and the rest is used as-is.
/// Protocol-relative links (`//host/path`) therefore resolve under the base
/// URL.
pub fn resolve_product_url(base_url: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", base_url, href)
    } else if !href.starts_with("http") {
        format!("{}/{}", base_url, href)
    } else {
        href.to_string()
    }
}

/// Runs the match check and field extraction on a product page
fn evaluate_product(
    identifier: &str,
    body: &str,
    site: &SiteConfig,
    record: &mut ResultRecord,
) -> ItemStatus {
    trace_stage(identifier, Stage::Parsing);
    let document = Html::parse_document(body);

    if site.require_exact_match {
        trace_stage(identifier, Stage::MatchChecking);
        if !is_exact_match(identifier, &document, site) {
            tracing::debug!(
                "{}: product page '{}' is not an exact match",
                identifier,
                page_title(&document, site).unwrap_or_default()
            );
            record.set(EXISTS_COLUMN, "No");
            return ItemStatus::NoExactMatch;
        }
    }
    record.set(EXISTS_COLUMN, "Yes");

    trace_stage(identifier, Stage::Extracting);
    for (name, rule) in &site.field_rules {
        if !record.contains(name) {
            record.set(name.clone(), extract_field(&document, rule));
        }
    }
    apply_derived_fields(record, site);

    let success_default = site
        .rule(&site.success_field)
        .map(|rule| rule.default_value.as_str())
        .unwrap_or(DEFAULT_VALUE);
    match record.get(&site.success_field) {
        Some(value) if value != success_default => ItemStatus::Success,
        _ => ItemStatus::PriceNotFound,
    }
}

/// Sets `In Stock` to the locations holding a positive quantity
fn apply_derived_fields(record: &mut ResultRecord, site: &SiteConfig) {
    let in_stock: Vec<&str> = site
        .stock_locations
        .iter()
        .filter(|location| {
            record
                .get(location)
                .filter(|quantity| *quantity != DEFAULT_VALUE)
                .and_then(|quantity| quantity.trim().parse::<f64>().ok())
                .is_some_and(|quantity| quantity > 0.0)
        })
        .map(String::as_str)
        .collect();

    let value = if in_stock.is_empty() {
        DEFAULT_VALUE.to_string()
    } else {
        in_stock.join(", ")
    };
    record.set(IN_STOCK_COLUMN, value);
}
