//! Exact-match evaluation of product pages

use crate::crawler::extract::element_text;
use crate::site::{normalize_part_number, Query, SiteConfig};
use scraper::Html;

/// Decides whether a product page is the exact match for an identifier
///
/// The identifier is compared with the page title and, independently, with
/// the SKU element. A missing element only rules out that candidate.
pub fn is_exact_match(identifier: &str, document: &Html, site: &SiteConfig) -> bool {
    if !site.require_exact_match {
        return true;
    }

    let wanted = canonical(identifier, site.normalize_id);

    [&site.title_query, &site.sku_query]
        .into_iter()
        .filter_map(|query| candidate_text(query, document))
        .any(|candidate| canonical(&candidate, site.normalize_id) == wanted)
}

fn candidate_text(query: &Query, document: &Html) -> Option<String> {
    query.first(document).map(|element| element.text().collect())
}

fn canonical(value: &str, normalize: bool) -> String {
    if normalize {
        normalize_part_number(value)
    } else {
        value.to_lowercase()
    }
}

/// Trimmed text of the page title, if any
pub fn page_title(document: &Html, site: &SiteConfig) -> Option<String> {
    site.title_query.first(document).map(element_text)
}
