use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Check whether a name is a valid DNS-1123 subdomain
/// (lowercase alphanumeric, '-' or '.', starting and ending alphanumeric)
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    let bytes = name.as_bytes();
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
        return false;
    }

    bytes.iter().all(|&b| alnum(b) || b == b'-' || b == b'.')
}

/// Base validation for all resources
pub fn validate_base(metadata: &ObjectMeta) -> Result<(), ResourceError> {
    let name = metadata
        .name
        .as_ref()
        .ok_or_else(|| ResourceError::MissingField("metadata.name".to_string()))?;

    if !is_valid_name(name) {
        return Err(ResourceError::InvalidName(name.clone()));
    }

    Ok(())
}

/// Trait for resource kinds served through the extension API
pub trait Resource: Serialize + for<'de> Deserialize<'de> + Send + Sync {
    /// Get the apiVersion of this resource (e.g., "tokens.annex.dev/v1alpha1")
    fn api_version(&self) -> String;

    /// Get the kind of this resource
    fn kind(&self) -> String;

    /// Get the metadata of this resource
    fn metadata(&self) -> &ObjectMeta;

    /// Get mutable metadata
    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    /// Get the resource name
    fn name(&self) -> Option<&str> {
        self.metadata().name.as_deref()
    }

    /// Get the resource namespace (None for cluster-scoped instances)
    fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }

    /// Get the UID
    fn uid(&self) -> Option<String> {
        self.metadata().uid.clone()
    }

    /// Set the UID
    fn set_uid(&mut self, uid: String) {
        self.metadata_mut().uid = Some(uid);
    }

    /// Validate the resource
    fn validate(&self) -> Result<(), ResourceError> {
        validate_base(self.metadata())
    }
}

/// Resource-related errors
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid resource name: {0}")]
    InvalidName(String),

    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("nginx"));
        assert!(is_valid_name("my-app"));
        assert!(is_valid_name("app-123"));
        assert!(is_valid_name("a.b.c"));

        assert!(!is_valid_name("MyApp")); // uppercase
        assert!(!is_valid_name("")); // empty
        assert!(!is_valid_name("-app")); // starts with dash
        assert!(!is_valid_name("app-")); // ends with dash
        assert!(!is_valid_name("has_underscore"));
    }

    #[test]
    fn test_validate_base() {
        let mut metadata = ObjectMeta::default();
        assert!(validate_base(&metadata).is_err());

        metadata.name = Some("valid-name".to_string());
        assert!(validate_base(&metadata).is_ok());

        metadata.name = Some("Invalid".to_string());
        assert!(validate_base(&metadata).is_err());
    }
}
