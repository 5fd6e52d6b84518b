//! Annex Tokens - secret-backed access token resources
//!
//! This crate provides:
//! - The `AccessToken` (namespaced) and `ClusterAccessToken` (cluster-scoped)
//!   resource kinds and their Secret projection
//! - A pluggable `SecretStore` with an in-memory implementation
//! - Resource handlers implementing the API server's dispatch contract

pub mod handlers;
pub mod store;
pub mod token;

// Re-export commonly used types
pub use handlers::{ClusterTokenHandler, TokenHandler};
pub use store::{MemorySecretStore, SecretStore, StoreError};
pub use token::{
    group_version, AccessToken, AccessTokenSpec, AccessTokenStatus, ClusterAccessToken, TokenList,
    GROUP, VERSION,
};

use annex_apiserver::Registry;
use annex_core::ApiResource;
use std::sync::Arc;

/// Register both token resource kinds against a registry
pub fn register(registry: &Registry, store: Arc<dyn SecretStore>) -> annex_core::Result<()> {
    let gv = group_version();

    registry.register(
        gv.clone(),
        ApiResource::new(
            "clusteraccesstokens",
            "clusteraccesstoken",
            false,
            "ClusterAccessToken",
            &["create", "list"],
        ),
        Arc::new(ClusterTokenHandler::new(store.clone())),
    )?;

    registry.register(
        gv,
        ApiResource::new(
            "accesstokens",
            "accesstoken",
            true,
            "AccessToken",
            &["create", "get", "delete", "patch"],
        ),
        Arc::new(TokenHandler::new(store)),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_populates_discovery() {
        let registry = Registry::new();
        let store = Arc::new(MemorySecretStore::new());

        register(&registry, store.clone()).unwrap();

        let list = registry.discovery_list(&group_version()).unwrap();
        let names: Vec<_> = list.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["clusteraccesstokens", "accesstokens"]);

        // Registering the same kinds twice is refused
        assert!(register(&registry, store).is_err());
    }
}
