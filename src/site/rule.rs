use crate::site::{FieldDefinition, Query};
use crate::ConfigError;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static NUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d,]+\.?\d*").expect("numeric regex is valid"));

/// Named post-processing step applied to an extracted value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// First run of digits (commas stripped), e.g. "$1,299.99 CAD" -> "1299.99"
    ExtractNumeric,

    /// Collapse whitespace runs to single spaces and trim
    CleanText,

    /// Identifier normalization: drop dashes, one trailing slash, lowercase
    NormalizePart,
}

impl Transform {
    /// Applies the transform, returning None when nothing usable remains
    pub fn apply(&self, value: &str) -> Option<String> {
        match self {
            Self::ExtractNumeric => extract_numeric(value),
            Self::CleanText => Some(clean_text(value)),
            Self::NormalizePart => Some(normalize_part_number(value)),
        }
    }
}

/// Canonical identifier form used for exact-match comparisons
pub fn normalize_part_number(value: &str) -> String {
    let without_dashes = value.replace('-', "");
    let trimmed = without_dashes
        .strip_suffix('/')
        .unwrap_or(&without_dashes);
    trimmed.to_lowercase().trim().to_string()
}

/// Returns the first numeric run of the value with commas removed
pub fn extract_numeric(value: &str) -> Option<String> {
    let without_commas = value.replace(',', "");
    NUMERIC_RUN
        .find(&without_commas)
        .map(|m| m.as_str().to_string())
}

/// Collapses internal whitespace and trims the ends
pub fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compiled field extraction rule
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub query: Option<Query>,
    pub attribute: Option<String>,
    pub pattern: Option<Regex>,
    pub transform: Option<Transform>,
    pub default_value: String,
}

impl FieldRule {
    /// Compiles a declarative field definition
    ///
    /// # Returns
    ///
    /// * `Ok(FieldRule)` - Selector and regex (if any) compiled
    /// * `Err(ConfigError)` - The selector or regex is invalid
    pub fn compile(definition: &FieldDefinition) -> Result<Self, ConfigError> {
        let query = definition
            .selector
            .as_deref()
            .map(Query::parse)
            .transpose()?;

        let pattern = definition
            .regex
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            query,
            attribute: definition.attribute.clone(),
            pattern,
            transform: definition.transform,
            default_value: definition.default.clone(),
        })
    }
}
