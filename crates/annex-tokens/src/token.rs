//! Access token resource types and their secret encoding.
//!
//! Tokens are not persisted as first-class objects; each one is projected
//! onto a Kubernetes `Secret` held by the backing [`SecretStore`], keeping
//! the token material out of the main object store.
//!
//! [`SecretStore`]: crate::store::SecretStore

use annex_core::{GroupVersion, ObjectMeta, Resource, Secret};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// API group for token resources
pub const GROUP: &str = "tokens.annex.dev";
/// API version for token resources
pub const VERSION: &str = "v1alpha1";

/// GroupVersion served by this crate
pub fn group_version() -> GroupVersion {
    GroupVersion::new(GROUP, VERSION)
}

fn api_version() -> String {
    format!("{}/{}", GROUP, VERSION)
}

/// A namespaced access token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: AccessTokenSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccessTokenStatus>,
}

impl Default for AccessToken {
    fn default() -> Self {
        Self {
            api_version: api_version(),
            kind: "AccessToken".to_string(),
            metadata: ObjectMeta::default(),
            spec: AccessTokenSpec::default(),
            status: None,
        }
    }
}

/// A cluster-scoped access token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAccessToken {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: AccessTokenSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccessTokenStatus>,
}

impl Default for ClusterAccessToken {
    fn default() -> Self {
        Self {
            api_version: api_version(),
            kind: "ClusterAccessToken".to_string(),
            metadata: ObjectMeta::default(),
            spec: AccessTokenSpec::default(),
            status: None,
        }
    }
}

/// Desired token properties, as supplied by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenSpec {
    #[serde(default, rename = "userID")]
    pub user_id: String,
    #[serde(default)]
    pub cluster_name: String,
    /// Time-to-live, as a duration string; empty means no expiry
    #[serde(default)]
    pub ttl: String,
    /// "true" or "false"; disabled tokens are kept but rejected at auth time
    #[serde(default)]
    pub enabled: String,
}

/// Issued token state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenStatus {
    #[serde(default)]
    pub hashed_token: String,
    /// Set only on the creation response; never persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plaintext_token: Option<String>,
}

const KEY_USER_ID: &str = "userID";
const KEY_CLUSTER_NAME: &str = "clusterName";
const KEY_TTL: &str = "ttl";
const KEY_ENABLED: &str = "enabled";
const KEY_HASHED_TOKEN: &str = "hashedToken";

/// Read one value from a secret, preferring `stringData` over `data`
fn secret_value(secret: &Secret, key: &str) -> String {
    if let Some(value) = secret
        .string_data
        .as_ref()
        .and_then(|data| data.get(key))
    {
        return value.clone();
    }

    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|bytes| String::from_utf8_lossy(&bytes.0).to_string())
        .unwrap_or_default()
}

fn token_string_data(spec: &AccessTokenSpec, status: Option<&AccessTokenStatus>) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    data.insert(KEY_USER_ID.to_string(), spec.user_id.clone());
    data.insert(KEY_CLUSTER_NAME.to_string(), spec.cluster_name.clone());
    data.insert(KEY_TTL.to_string(), spec.ttl.clone());
    data.insert(KEY_ENABLED.to_string(), spec.enabled.clone());
    data.insert(
        KEY_HASHED_TOKEN.to_string(),
        status.map(|s| s.hashed_token.clone()).unwrap_or_default(),
    );
    data
}

fn spec_from_secret(secret: &Secret) -> AccessTokenSpec {
    AccessTokenSpec {
        user_id: secret_value(secret, KEY_USER_ID),
        cluster_name: secret_value(secret, KEY_CLUSTER_NAME),
        ttl: secret_value(secret, KEY_TTL),
        enabled: secret_value(secret, KEY_ENABLED),
    }
}

impl AccessToken {
    /// Project this token onto its backing secret
    pub fn to_secret(&self) -> Secret {
        Secret {
            metadata: self.metadata.clone(),
            string_data: Some(token_string_data(&self.spec, self.status.as_ref())),
            ..Secret::default()
        }
    }

    /// Rebuild a token from its backing secret; plaintext is never recovered
    pub fn from_secret(secret: &Secret) -> Self {
        Self {
            metadata: secret.metadata.clone(),
            spec: spec_from_secret(secret),
            status: Some(AccessTokenStatus {
                hashed_token: secret_value(secret, KEY_HASHED_TOKEN),
                plaintext_token: None,
            }),
            ..Self::default()
        }
    }
}

impl Resource for AccessToken {
    fn api_version(&self) -> String {
        self.api_version.clone()
    }

    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl ClusterAccessToken {
    pub fn to_secret(&self) -> Secret {
        Secret {
            metadata: self.metadata.clone(),
            string_data: Some(token_string_data(&self.spec, self.status.as_ref())),
            ..Secret::default()
        }
    }

    pub fn from_secret(secret: &Secret) -> Self {
        Self {
            metadata: secret.metadata.clone(),
            spec: spec_from_secret(secret),
            status: Some(AccessTokenStatus {
                hashed_token: secret_value(secret, KEY_HASHED_TOKEN),
                plaintext_token: None,
            }),
            ..Self::default()
        }
    }
}

impl Resource for ClusterAccessToken {
    fn api_version(&self) -> String {
        self.api_version.clone()
    }

    fn kind(&self) -> String {
        self.kind.clone()
    }

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

/// List envelope for token collections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenList<T> {
    pub api_version: String,
    pub kind: String,
    pub items: Vec<T>,
    pub metadata: ListMetadata,
}

/// List metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMetadata {
    #[serde(rename = "resourceVersion")]
    pub resource_version: String,
}

impl<T> TokenList<T> {
    pub fn new(kind: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            api_version: api_version(),
            kind: kind.into(),
            items,
            metadata: ListMetadata {
                resource_version: Uuid::new_v4().to_string(),
            },
        }
    }
}
