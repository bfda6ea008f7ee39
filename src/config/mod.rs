//! Configuration module for Part-Scout
//!
//! Run settings come from an optional TOML file, `.env` and the process
//! environment (environment wins). The file may also declare additional
//! sites in `[[site]]` tables next to the built-in ones.
//!
//! # Example
//!
//! ```no_run
//! use part_scout::config::{build_registry, load_settings};
//! use std::path::Path;
//!
//! let (settings, _hash) = load_settings(Some(Path::new("part-scout.toml"))).unwrap();
//! let registry = build_registry(&settings).unwrap();
//! println!("{} sites available", registry.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{EmailSettings, LoggingSettings, ProxySettings, ScraperSettings, Settings};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, load_settings,
};

use crate::site::SiteRegistry;
use crate::ConfigError;

/// Builds the site registry: built-in sites first, then those from the settings
pub fn build_registry(settings: &Settings) -> Result<SiteRegistry, ConfigError> {
    let mut registry = SiteRegistry::with_builtin_sites()?;
    for definition in &settings.sites {
        registry.register_definition(definition.clone())?;
    }
    Ok(registry)
}
