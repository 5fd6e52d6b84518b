//! Pluggable secret persistence for token material.

use annex_core::Secret;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Secret store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("secret not found: {namespace}/{name}")]
    NotFound { namespace: String, name: String },

    #[error("secret already exists: {namespace}/{name}")]
    AlreadyExists { namespace: String, name: String },

    #[error("secret has no metadata.name")]
    MissingName,
}

/// Capability for storing and retrieving secrets.
///
/// Cluster-scoped callers pass an empty namespace. In a deployed server this
/// is backed by the cluster's Secret API; tests and local development use
/// [`MemorySecretStore`].
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret, StoreError>;
    async fn create(&self, namespace: &str, secret: Secret) -> Result<Secret, StoreError>;
    async fn upsert(&self, namespace: &str, secret: Secret) -> Result<Secret, StoreError>;
    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError>;
    async fn list(&self, namespace: &str) -> Result<Vec<Secret>, StoreError>;
}

/// In-memory secret store
///
/// Keeps secrets in a map keyed by (namespace, name) so tests can exercise
/// the token handlers without a cluster.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<(String, String), Secret>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn secret_name(secret: &Secret) -> Result<String, StoreError> {
    secret
        .metadata
        .name
        .clone()
        .ok_or(StoreError::MissingName)
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        let secrets = self.secrets.read().await;
        secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn create(&self, namespace: &str, secret: Secret) -> Result<Secret, StoreError> {
        let name = secret_name(&secret)?;
        let key = (namespace.to_string(), name.clone());

        let mut secrets = self.secrets.write().await;
        if secrets.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                namespace: namespace.to_string(),
                name,
            });
        }

        debug!("Storing secret {}/{}", namespace, name);
        secrets.insert(key, secret.clone());
        Ok(secret)
    }

    async fn upsert(&self, namespace: &str, secret: Secret) -> Result<Secret, StoreError> {
        let name = secret_name(&secret)?;

        debug!("Upserting secret {}/{}", namespace, name);
        let mut secrets = self.secrets.write().await;
        secrets.insert((namespace.to_string(), name), secret.clone());
        Ok(secret)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut secrets = self.secrets.write().await;
        secrets
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| debug!("Deleted secret {}/{}", namespace, name))
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list(&self, namespace: &str) -> Result<Vec<Secret>, StoreError> {
        let secrets = self.secrets.read().await;
        let mut matched: Vec<_> = secrets
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, secret)| secret.clone())
            .collect();

        // Map iteration order is arbitrary; keep listings stable
        matched.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(name: &str) -> Secret {
        let mut secret = Secret::default();
        secret.metadata.name = Some(name.to_string());
        secret
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let store = MemorySecretStore::new();

        store.create("default", secret("a")).await.unwrap();
        let fetched = store.get("default", "a").await.unwrap();
        assert_eq!(fetched.metadata.name.as_deref(), Some("a"));

        store.delete("default", "a").await.unwrap();
        assert!(matches!(
            store.get("default", "a").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let store = MemorySecretStore::new();

        store.create("default", secret("a")).await.unwrap();
        assert!(matches!(
            store.create("default", secret("a")).await,
            Err(StoreError::AlreadyExists { .. })
        ));

        // Same name in another namespace is a different secret
        store.create("other", secret("a")).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = MemorySecretStore::new();

        store.create("default", secret("a")).await.unwrap();

        let mut updated = secret("a");
        updated.string_data = Some([("k".to_string(), "v".to_string())].into());
        store.upsert("default", updated).await.unwrap();

        let fetched = store.get("default", "a").await.unwrap();
        assert!(fetched.string_data.is_some());
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_sorted() {
        let store = MemorySecretStore::new();

        store.create("default", secret("b")).await.unwrap();
        store.create("default", secret("a")).await.unwrap();
        store.create("other", secret("c")).await.unwrap();
        store.create("", secret("cluster-wide")).await.unwrap();

        let listed = store.list("default").await.unwrap();
        let names: Vec<_> = listed
            .iter()
            .map(|s| s.metadata.name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let cluster = store.list("").await.unwrap();
        assert_eq!(cluster.len(), 1);
    }

    #[tokio::test]
    async fn test_create_without_name_fails() {
        let store = MemorySecretStore::new();
        assert!(matches!(
            store.create("default", Secret::default()).await,
            Err(StoreError::MissingName)
        ));
    }
}
