//! Provider icon catalogs
//!
//! Each supported cloud provider contributes a static catalog mapping fully
//! qualified Terraform resource types (e.g. `aws_eks_cluster`) to the icon
//! drawn for that resource. The [`ProviderRegistry`] dispatches on the
//! provider prefix, the substring before the first `_`.
//!
//! A resource type is diagram-worthy when its provider catalog lists it.
//! Unknown prefixes and unlisted types are a plain "not found", never an error.

pub mod aws;
pub mod azurerm;
pub mod google;
pub mod registry;

pub use aws::AwsCatalog;
pub use azurerm::AzureCatalog;
pub use google::GoogleCatalog;
pub use registry::ProviderRegistry;

/// Icon lookup capability for one cloud provider
pub trait IconCatalog: Send + Sync {
    /// Provider prefix this catalog answers for (e.g. "aws")
    fn prefix(&self) -> &'static str;

    /// Static table of (resource type, icon URI) pairs
    fn entries(&self) -> &'static [(&'static str, &'static str)];

    /// Icon URI for a resource type, if the catalog lists it
    fn icon(&self, resource_type: &str) -> Option<&'static str> {
        self.entries()
            .iter()
            .find(|(name, _)| *name == resource_type)
            .map(|(_, uri)| *uri)
    }

    /// Whether the resource type has a node representation
    fn is_node(&self, resource_type: &str) -> bool {
        self.icon(resource_type).is_some()
    }
}

/// Provider prefix of a resource type: everything before the first `_`
pub fn provider_prefix(resource_type: &str) -> &str {
    resource_type
        .split_once('_')
        .map(|(prefix, _)| prefix)
        .unwrap_or(resource_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_prefix() {
        assert_eq!(provider_prefix("aws_eks_cluster"), "aws");
        assert_eq!(provider_prefix("azurerm_virtual_network"), "azurerm");
        assert_eq!(provider_prefix("google_compute_instance"), "google");
        assert_eq!(provider_prefix("random"), "random");
        assert_eq!(provider_prefix(""), "");
    }
}
