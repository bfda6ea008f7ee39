use crate::site::Transform;
use crate::state::DEFAULT_VALUE;
use serde::Deserialize;

/// Declarative description of a scraping target, as written in TOML or code
///
/// This is the uncompiled form; [`crate::site::SiteConfig::from_definition`]
/// validates it and compiles its selectors and patterns.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteDefinition {
    /// Registry key (e.g. "g2s")
    pub id: String,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Scheme and host, without trailing slash (e.g. "https://example.com")
    pub base_url: String,

    /// Path of the search endpoint (e.g. "/search.php")
    pub search_path: String,

    /// Query parameter carrying the identifier (e.g. "search_query")
    pub search_param_name: String,

    /// Selector locating the product link on the search results page
    pub product_link_selector: String,

    /// Attribute of the product link holding the product URL
    #[serde(default = "default_link_attribute")]
    pub product_link_attribute: String,

    /// Ordered field extraction rules
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldDefinition>,

    /// Pattern identifiers must match to be processed
    #[serde(default = "default_id_pattern")]
    pub id_pattern: String,

    /// Strip dashes and a trailing slash and lowercase identifiers before comparing
    #[serde(default = "default_true")]
    pub normalize_id: bool,

    /// Verify the product page against the identifier before extracting fields
    #[serde(default = "default_true")]
    pub require_exact_match: bool,

    /// Selector for the product title heading used by exact matching
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Selector for the SKU element used by exact matching
    #[serde(default = "default_sku_selector")]
    pub sku_selector: String,

    /// Field that must resolve for an item to count as a success
    #[serde(default = "default_success_field")]
    pub success_field: String,

    /// Inventory fields summarised into the `In Stock` column
    #[serde(default = "default_stock_locations")]
    pub stock_locations: Vec<String>,

    /// Output column order
    #[serde(default)]
    pub output_columns: Vec<String>,
}

/// Declarative field extraction rule
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDefinition {
    /// Output column name
    pub name: String,

    /// Selector for the element holding the value
    #[serde(default)]
    pub selector: Option<String>,

    /// Read this attribute instead of the element text
    #[serde(default)]
    pub attribute: Option<String>,

    /// Regex applied to the extracted value; group 1 becomes the value
    #[serde(default)]
    pub regex: Option<String>,

    /// Named transform applied last
    #[serde(default)]
    pub transform: Option<Transform>,

    /// Value used when nothing resolves
    #[serde(default = "default_value")]
    pub default: String,
}

impl FieldDefinition {
    /// Creates a rule with only a name; every step is disabled
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: None,
            attribute: None,
            regex: None,
            transform: None,
            default: default_value(),
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = value.into();
        self
    }
}

fn default_link_attribute() -> String {
    "href".to_string()
}

pub(crate) fn default_id_pattern() -> String {
    r"^[\w\-/\.]{1,64}$".to_string()
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_title_selector() -> String {
    "h1.productView-title".to_string()
}

pub(crate) fn default_sku_selector() -> String {
    "div.productView-sku span".to_string()
}

pub(crate) fn default_success_field() -> String {
    "Price".to_string()
}

pub(crate) fn default_stock_locations() -> Vec<String> {
    ["Montreal", "Mississauga", "Edmonton"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_value() -> String {
    DEFAULT_VALUE.to_string()
}
