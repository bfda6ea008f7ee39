use crate::site::{builtin, SiteConfig, SiteDefinition};
use crate::ConfigError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available site configurations
///
/// Lookup by id is constant time; listing preserves registration order.
#[derive(Debug, Default)]
pub struct SiteRegistry {
    sites: Vec<Arc<SiteConfig>>,
    index: HashMap<String, usize>,
}

impl SiteRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in sites
    pub fn with_builtin_sites() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for definition in builtin::definitions() {
            registry.register_definition(definition)?;
        }
        Ok(registry)
    }

    /// Registers a site, replacing an existing entry with the same id in place
    ///
    /// # Returns
    ///
    /// The previously registered configuration for this id, if any
    pub fn register(&mut self, config: SiteConfig) -> Option<Arc<SiteConfig>> {
        let config = Arc::new(config);
        match self.index.get(&config.id) {
            Some(&position) => Some(std::mem::replace(&mut self.sites[position], config)),
            None => {
                self.index.insert(config.id.clone(), self.sites.len());
                self.sites.push(config);
                None
            }
        }
    }

    /// Compiles and registers a declarative site definition
    pub fn register_definition(&mut self, definition: SiteDefinition) -> Result<(), ConfigError> {
        let config = SiteConfig::from_definition(definition)?;
        if let Some(previous) = self.register(config) {
            tracing::info!("Site '{}' redefined; later definition wins", previous.id);
        }
        Ok(())
    }

    /// Gets a site configuration by id
    pub fn get(&self, id: &str) -> Option<Arc<SiteConfig>> {
        self.index.get(id).map(|&position| Arc::clone(&self.sites[position]))
    }

    /// Returns all registered sites in registration order
    pub fn list(&self) -> &[Arc<SiteConfig>] {
        &self.sites
    }

    /// Returns all registered ids in registration order
    pub fn ids(&self) -> Vec<&str> {
        self.sites.iter().map(|site| site.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
