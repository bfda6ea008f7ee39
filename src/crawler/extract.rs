//! Field extraction engine
//!
//! Interprets a compiled [`FieldRule`] against a parsed document. Every
//! evaluation yields exactly one value: the extracted one or the rule's
//! default.

use crate::site::FieldRule;
use scraper::{ElementRef, Html};

/// Extracts a single field value from a parsed document
///
/// Steps, each falling back to the rule's default on absence:
/// 1. select the first element matching the rule's query
/// 2. read the configured attribute, or the element's text
/// 3. replace the value with the first capture group of the rule's regex
/// 4. apply the rule's transform
///
/// A rule without a query never selects anything and yields its default.
pub fn extract_field(document: &Html, rule: &FieldRule) -> String {
    let default = rule.default_value.as_str();

    let mut value = match rule.query.as_ref().and_then(|query| query.first(document)) {
        Some(element) => match rule.attribute.as_deref() {
            Some(attribute) => element
                .value()
                .attr(attribute)
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string()),
            None => element_text(element),
        },
        None => default.to_string(),
    };

    if let Some(pattern) = rule.pattern.as_ref() {
        if value != default {
            value = pattern
                .captures(&value)
                .and_then(|caps| caps.get(1))
                .map(|group| group.as_str().to_string())
                .unwrap_or_else(|| default.to_string());
        }
    }

    if let Some(transform) = rule.transform {
        if value != default {
            value = transform
                .apply(&value)
                .unwrap_or_else(|| default.to_string());
        }
    }

    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Text content of an element: each text node trimmed, empty ones dropped
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect()
}
