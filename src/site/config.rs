use crate::site::{FieldRule, Query, SiteDefinition};
use crate::state::{
    ERROR_COLUMN, EXISTS_COLUMN, IN_STOCK_COLUMN, PART_NUMBER_COLUMN, STATUS_CODE_COLUMN,
    STATUS_COLUMN,
};
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Validated, compiled description of a scraping target
///
/// Built once at startup and shared read-only by every pipeline invocation.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub id: String,
    pub name: String,
    pub description: String,

    pub base_url: String,
    pub search_path: String,
    pub search_param_name: String,

    pub product_link: Query,
    pub product_link_attribute: String,

    /// Field rules in declaration order
    pub field_rules: Vec<(String, FieldRule)>,

    /// Identifier pattern, anchored at the start of the identifier
    pub id_pattern: Regex,
    pub normalize_id: bool,
    pub require_exact_match: bool,

    pub title_query: Query,
    pub sku_query: Query,

    pub success_field: String,
    pub stock_locations: Vec<String>,

    /// Output columns; always includes `Part Number` and `Status`
    pub output_columns: Vec<String>,
}

impl SiteConfig {
    /// Validates a definition and compiles its selectors and patterns
    ///
    /// # Returns
    ///
    /// * `Ok(SiteConfig)` - Ready-to-use site configuration
    /// * `Err(ConfigError)` - A required field is empty or a selector/regex is invalid
    pub fn from_definition(definition: SiteDefinition) -> Result<Self, ConfigError> {
        validate_definition(&definition)?;

        let id_pattern = Regex::new(&format!("^(?:{})", definition.id_pattern)).map_err(
            |source| ConfigError::InvalidPattern {
                pattern: definition.id_pattern.clone(),
                source,
            },
        )?;

        let field_rules = definition
            .fields
            .iter()
            .map(|field| Ok((field.name.clone(), FieldRule::compile(field)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let output_columns = resolve_output_columns(&definition);

        Ok(Self {
            product_link: Query::parse(&definition.product_link_selector)?,
            title_query: Query::parse(&definition.title_selector)?,
            sku_query: Query::parse(&definition.sku_selector)?,
            id_pattern,
            field_rules,
            output_columns,
            id: definition.id,
            name: definition.name,
            description: definition.description,
            base_url: definition.base_url,
            search_path: definition.search_path,
            search_param_name: definition.search_param_name,
            product_link_attribute: definition.product_link_attribute,
            normalize_id: definition.normalize_id,
            require_exact_match: definition.require_exact_match,
            success_field: definition.success_field,
            stock_locations: definition.stock_locations,
        })
    }

    /// Full URL of the search endpoint
    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url, self.search_path)
    }

    /// Returns true if the identifier is eligible for processing on this site
    pub fn accepts(&self, identifier: &str) -> bool {
        self.id_pattern.is_match(identifier.trim())
    }

    /// Returns the rule configured for a field, if any
    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.field_rules
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, rule)| rule)
    }
}

/// Validates the plain-data parts of a site definition
fn validate_definition(definition: &SiteDefinition) -> Result<(), ConfigError> {
    let required = [
        ("id", &definition.id),
        ("name", &definition.name),
        ("base-url", &definition.base_url),
        ("search-path", &definition.search_path),
        ("search-param-name", &definition.search_param_name),
        ("product-link-selector", &definition.product_link_selector),
        ("product-link-attribute", &definition.product_link_attribute),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}': {} cannot be empty",
                definition.id, field
            )));
        }
    }

    let base = Url::parse(&definition.base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "site '{}': invalid base-url '{}': {}",
            definition.id, definition.base_url, e
        ))
    })?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "site '{}': base-url '{}' must use http or https",
            definition.id, definition.base_url
        )));
    }

    let mut seen = HashSet::new();
    for field in &definition.fields {
        if field.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}': field name cannot be empty",
                definition.id
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "site '{}': duplicate field '{}'",
                definition.id, field.name
            )));
        }
    }

    Ok(())
}

/// Applies the output column defaults and the identity-column invariant
fn resolve_output_columns(definition: &SiteDefinition) -> Vec<String> {
    let mut columns = if definition.output_columns.is_empty() {
        let mut defaults = vec![
            PART_NUMBER_COLUMN.to_string(),
            STATUS_CODE_COLUMN.to_string(),
            EXISTS_COLUMN.to_string(),
        ];
        for field in &definition.fields {
            if !defaults.contains(&field.name) {
                defaults.push(field.name.clone());
            }
        }
        for column in [IN_STOCK_COLUMN, STATUS_COLUMN, ERROR_COLUMN] {
            if !defaults.iter().any(|c| c == column) {
                defaults.push(column.to_string());
            }
        }
        defaults
    } else {
        definition.output_columns.clone()
    };

    if !columns.iter().any(|c| c == PART_NUMBER_COLUMN) {
        columns.insert(0, PART_NUMBER_COLUMN.to_string());
    }
    if !columns.iter().any(|c| c == STATUS_COLUMN) {
        columns.push(STATUS_COLUMN.to_string());
    }
    columns
}
