use serde::{Deserialize, Serialize};
use std::fmt;

/// GroupVersion identifies an API namespace served under `/apis`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersion {
    /// API group (e.g., "tokens.annex.dev")
    pub group: String,
    /// API version (e.g., "v1alpha1")
    pub version: String,
}

impl GroupVersion {
    /// Create a new GroupVersion
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Derive the composite key for one resource kind under this GroupVersion
    pub fn with_resource(&self, resource: impl Into<String>) -> GroupVersionResource {
        GroupVersionResource {
            group: self.group.clone(),
            version: self.version.clone(),
            resource: resource.into(),
        }
    }

    /// Get the apiVersion string (group/version, or just version for the legacy core group)
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_version())
    }
}

/// GroupVersionResource identifies exactly one resource kind's handler slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionResource {
    pub group: String,
    pub version: String,
    /// Plural resource name (e.g., "accesstokens")
    pub resource: String,
}

impl GroupVersionResource {
    /// Create a new GVR
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// Get the GroupVersion part of this GVR
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }
}

impl fmt::Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.version, self.resource)
    }
}

/// ApiResource describes one registrable resource kind in a discovery document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    /// Plural resource name (e.g., "accesstokens")
    pub name: String,
    /// Singular resource name (e.g., "accesstoken")
    pub singular_name: String,
    /// Whether instances are partitioned under a namespace
    pub namespaced: bool,
    /// Object kind (e.g., "AccessToken")
    pub kind: String,
    /// Supported verbs; advisory discovery metadata, not enforced by the router
    pub verbs: Vec<String>,
}

impl ApiResource {
    /// Create a new ApiResource descriptor
    pub fn new(
        name: impl Into<String>,
        singular_name: impl Into<String>,
        namespaced: bool,
        kind: impl Into<String>,
        verbs: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            singular_name: singular_name.into(),
            namespaced,
            kind: kind.into(),
            verbs: verbs.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// ApiResourceList is the discovery document for one GroupVersion
///
/// Serializes with the meta.v1 APIResourceList wire shape the discovery
/// clients expect: `kind`, `apiVersion`, `groupVersion`, `resources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub api_version: String,
    /// GroupVersion string, e.g. "tokens.annex.dev/v1alpha1"
    pub group_version: String,
    /// Registered resources, in registration order
    pub resources: Vec<ApiResource>,
}

impl ApiResourceList {
    /// Create an empty discovery list for the given GroupVersion
    pub fn new(group_version: GroupVersion) -> Self {
        Self {
            kind: "APIResourceList".to_string(),
            api_version: "v1".to_string(),
            group_version: group_version.api_version(),
            resources: Vec::new(),
        }
    }
}

/// Generic operation outcome, serialized as a meta.v1 Status object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub api_version: String,
    /// "Success" or "Failure"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl Status {
    /// Create a Success status
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "Status".to_string(),
            api_version: "v1".to_string(),
            status: "Success".to_string(),
            message: Some(message.into()),
            code: Some(200),
        }
    }

    /// Create a Failure status with the given HTTP code
    pub fn failure(message: impl Into<String>, code: u16) -> Self {
        Self {
            kind: "Status".to_string(),
            api_version: "v1".to_string(),
            status: "Failure".to_string(),
            message: Some(message.into()),
            code: Some(code),
        }
    }
}
