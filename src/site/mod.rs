//! Site configuration module
//!
//! A site is described declaratively (`SiteDefinition`, loadable from TOML)
//! and compiled once into a `SiteConfig`: selectors parsed, regexes built,
//! output columns resolved. The scraping engine is a single interpreter
//! driven by this data; there is no per-site code.
//!
//! # Example
//!
//! ```no_run
//! use part_scout::site::SiteRegistry;
//!
//! let registry = SiteRegistry::with_builtin_sites().unwrap();
//! let g2s = registry.get("g2s").unwrap();
//! println!("Search URL: {}", g2s.search_url());
//! ```

pub mod builtin;
mod config;
mod query;
mod registry;
mod rule;
mod types;

pub use config::SiteConfig;
pub use query::Query;
pub use registry::SiteRegistry;
pub use rule::{clean_text, extract_numeric, normalize_part_number, FieldRule, Transform};
pub use types::{FieldDefinition, SiteDefinition};
