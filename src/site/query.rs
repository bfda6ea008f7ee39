//! Document queries used by site rules
//!
//! Plain CSS selectors are handled by the `scraper` crate. On top of that a
//! text-contains pseudo-class is supported, which is how label/value pairs
//! such as `<dt>stock-montreal:</dt><dd>10</dd>` are addressed:
//!
//! ```text
//! dt:-soup-contains('stock-montreal:') + dd
//! dt:contains("Dropship Item:") + dd
//! span.label:contains('SKU')
//! ```

use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static CONTAINS_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<anchor>.*?):(?:-soup-)?contains\(\s*(?:'(?P<single>[^']*)'|"(?P<double>[^"]*)")\s*\)\s*(?:\+\s*(?P<sibling>\S.*))?$"#,
    )
    .expect("contains syntax regex is valid")
});

/// A compiled document query
#[derive(Debug, Clone)]
pub enum Query {
    /// Plain CSS selector
    Css(Selector),

    /// Element matching `anchor` whose text contains `needle`, optionally
    /// followed by its adjacent element sibling matching `sibling`
    Contains {
        anchor: Selector,
        needle: String,
        sibling: Option<Selector>,
    },
}

impl Query {
    /// Compiles a query expression
    ///
    /// # Returns
    ///
    /// * `Ok(Query)` - Successfully compiled query
    /// * `Err(ConfigError::InvalidSelector)` - The expression is not a valid selector
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(invalid(expression, "selector cannot be empty"));
        }

        let Some(caps) = CONTAINS_SYNTAX.captures(expression) else {
            return Ok(Self::Css(compile_css(expression, expression)?));
        };

        let anchor = match caps["anchor"].trim() {
            "" => "*",
            anchor => anchor,
        };
        let needle = caps
            .name("single")
            .or_else(|| caps.name("double"))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let sibling = caps
            .name("sibling")
            .map(|m| compile_css(m.as_str().trim(), expression))
            .transpose()?;

        Ok(Self::Contains {
            anchor: compile_css(anchor, expression)?,
            needle,
            sibling,
        })
    }

    /// Returns the first element matching this query, in document order
    pub fn first<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        match self {
            Self::Css(selector) => document.select(selector).next(),
            Self::Contains {
                anchor,
                needle,
                sibling,
            } => document
                .select(anchor)
                .filter(|element| element.text().collect::<String>().contains(needle.as_str()))
                .find_map(|element| match sibling {
                    None => Some(element),
                    Some(target) => {
                        next_element_sibling(element).filter(|next| target.matches(next))
                    }
                }),
        }
    }
}

fn next_element_sibling(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.next_siblings().find_map(ElementRef::wrap)
}

fn compile_css(css: &str, expression: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| invalid(expression, &format!("{:?}", e)))
}

fn invalid(expression: &str, message: &str) -> ConfigError {
    ConfigError::InvalidSelector {
        selector: expression.to_string(),
        message: message.to_string(),
    }
}
