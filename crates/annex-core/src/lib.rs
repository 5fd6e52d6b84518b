//! Annex Core - Fundamental types for the Annex API extension server
//!
//! This crate provides:
//! - Group/version identifiers and discovery document types
//! - The `Resource` trait implemented by served resource kinds
//! - Error types with miette diagnostics
//! - Serialization helpers

pub mod error;
pub mod resources;
pub mod types;

// Re-export commonly used types
pub use error::{AnnexError, Result};
pub use resources::{is_valid_name, validate_base, Resource, ResourceError};
pub use types::{ApiResource, ApiResourceList, GroupVersion, GroupVersionResource, Status};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::Secret;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Serialize a value to JSON
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        AnnexError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a value from JSON
pub fn from_json<T: for<'de> serde::Deserialize<'de>>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| {
        AnnexError::serialization_error(
            format!("Failed to deserialize from JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Serialize a value to YAML
pub fn to_yaml<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    let yaml = serde_yaml::to_string(value).map_err(|e| {
        AnnexError::serialization_error(
            format!("Failed to serialize to YAML: {}", e),
            Some(Box::new(e)),
        )
    })?;
    Ok(yaml.into_bytes())
}

/// Deserialize a value from YAML
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &[u8]) -> Result<T> {
    serde_yaml::from_slice(data).map_err(|e| {
        AnnexError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_roundtrip() {
        let list = ApiResourceList::new(GroupVersion::new("tokens.annex.dev", "v1alpha1"));

        let json = to_json(&list).unwrap();
        let text = String::from_utf8(json.clone()).unwrap();
        assert!(text.contains("tokens.annex.dev/v1alpha1"));

        let deserialized: ApiResourceList = from_json(&json).unwrap();
        assert_eq!(deserialized.group_version, "tokens.annex.dev/v1alpha1");
    }

    #[test]
    fn test_yaml_roundtrip() {
        let status = Status::failure("not found", 404);

        let yaml = to_yaml(&status).unwrap();
        let text = String::from_utf8(yaml.clone()).unwrap();
        assert!(text.contains("Failure"));

        let deserialized: Status = from_yaml(&yaml).unwrap();
        assert_eq!(deserialized.message.as_deref(), Some("not found"));
    }
}
