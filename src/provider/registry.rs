use std::collections::HashMap;
use std::sync::Arc;

use super::{AwsCatalog, AzureCatalog, GoogleCatalog, IconCatalog, provider_prefix};

/// Registry of provider icon catalogs keyed by provider prefix
///
/// Classification and icon resolution both dispatch through this table:
/// adding a provider means registering a catalog, nothing else.
pub struct ProviderRegistry {
    catalogs: HashMap<&'static str, Arc<dyn IconCatalog>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            catalogs: HashMap::new(),
        }
    }

    /// Create a registry with all built-in catalogs
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AwsCatalog));
        registry.register(Arc::new(AzureCatalog));
        registry.register(Arc::new(GoogleCatalog));
        registry
    }

    /// Register a catalog under its own prefix, replacing any previous one
    pub fn register(&mut self, catalog: Arc<dyn IconCatalog>) -> &mut Self {
        self.catalogs.insert(catalog.prefix(), catalog);
        self
    }

    /// Catalog responsible for a resource type
    fn catalog_for(&self, resource_type: &str) -> Option<&Arc<dyn IconCatalog>> {
        self.catalogs.get(provider_prefix(resource_type))
    }

    /// Whether a resource type has a node representation in its provider catalog
    pub fn is_diagram_node(&self, resource_type: &str) -> bool {
        self.catalog_for(resource_type)
            .is_some_and(|catalog| catalog.is_node(resource_type))
    }

    /// Resolve the icon URI for a resource type
    ///
    /// Returns `None` for an unknown provider prefix or a type the provider
    /// catalog does not list.
    pub fn resolve_icon(&self, resource_type: &str) -> Option<&'static str> {
        self.catalog_for(resource_type)?.icon(resource_type)
    }

    /// Registered provider prefixes, sorted
    pub fn prefixes(&self) -> Vec<&'static str> {
        let mut prefixes: Vec<_> = self.catalogs.keys().copied().collect();
        prefixes.sort_unstable();
        prefixes
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
