//! Part-Scout: a configurable two-stage product scraper
//!
//! Given a list of part numbers, this crate searches a vendor website for each
//! one, follows the first product link to the detail page, extracts fields via
//! declarative selector rules and writes the results to a tabular file.

pub mod config;
pub mod crawler;
pub mod input;
pub mod logging;
pub mod notify;
pub mod output;
pub mod site;
pub mod state;

use thiserror::Error;

/// Main error type for Part-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Input error: {0}")]
    Input(#[from] input::InputError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Unknown site '{id}'. Available sites: {available}")]
    UnknownSite { id: String, available: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// These are fatal: they are raised before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid regex '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Raised when every fetch attempt for a URL was rate limited or failed in transport
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch {url} after {attempts} attempts.")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
}

/// Result type alias for Part-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Settings;
pub use site::{FieldRule, SiteConfig, SiteRegistry, Transform};
pub use state::{ItemStatus, ProcessedSet, ResultRecord};
