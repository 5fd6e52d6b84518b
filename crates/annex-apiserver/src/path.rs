//! Request path grammar for the two supported dispatch shapes.
//!
//! All paths share the fixed prefix `/apis/{group}/{version}`:
//!
//! - namespaced: `.../namespaces/{namespace}/{resource}[/{name}]`
//! - cluster:    `.../{resource}[/{name}]`
//!
//! Parsing is pure and never consults the registry. A trailing object name
//! is not split off here; handlers read it from the request path themselves.

use annex_core::{AnnexError, Result};

/// Segment index of the `namespaces` literal in a namespaced path
const SCOPE_SEGMENT: usize = 3;

/// Parsed namespaced dispatch path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacedPath {
    pub namespace: String,
    pub resource: String,
}

fn segments(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').collect()
}

/// Check whether a dispatch path uses the namespaced shape
pub fn is_namespaced(path: &str) -> bool {
    segments(path).get(SCOPE_SEGMENT) == Some(&"namespaces")
}

/// Extract the namespace and resource from a namespaced dispatch path
pub fn split_namespace_resource(path: &str) -> Result<NamespacedPath> {
    let segments = segments(path);

    if segments.len() < SCOPE_SEGMENT + 3 {
        return Err(AnnexError::malformed_path(path));
    }

    if segments[SCOPE_SEGMENT] != "namespaces" {
        return Err(AnnexError::malformed_path(path));
    }

    Ok(NamespacedPath {
        namespace: segments[SCOPE_SEGMENT + 1].to_string(),
        resource: segments[SCOPE_SEGMENT + 2].to_string(),
    })
}

/// Extract the resource from a cluster-scoped dispatch path
pub fn split_resource(path: &str) -> Result<String> {
    let segments = segments(path);

    if segments.len() < SCOPE_SEGMENT + 1 {
        return Err(AnnexError::malformed_path(path));
    }

    Ok(segments[SCOPE_SEGMENT].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_with_name() {
        let parsed =
            split_namespace_resource("/apis/x.io/v1/namespaces/team-a/widgets/foo").unwrap();
        assert_eq!(parsed.namespace, "team-a");
        assert_eq!(parsed.resource, "widgets");
    }

    #[test]
    fn test_namespaced_without_name() {
        let parsed = split_namespace_resource("/apis/x.io/v1/namespaces/team-a/widgets").unwrap();
        assert_eq!(parsed.namespace, "team-a");
        assert_eq!(parsed.resource, "widgets");
    }

    #[test]
    fn test_namespaced_too_short() {
        assert!(split_namespace_resource("/apis/x.io/v1").is_err());
        assert!(split_namespace_resource("/apis/x.io/v1/namespaces").is_err());
        assert!(split_namespace_resource("/apis/x.io/v1/namespaces/team-a").is_err());
    }

    #[test]
    fn test_namespaced_wrong_marker() {
        assert!(split_namespace_resource("/apis/x.io/v1/spacenames/team-a/widgets").is_err());
    }

    #[test]
    fn test_cluster_shape() {
        assert_eq!(split_resource("/apis/x.io/v1/widgets").unwrap(), "widgets");
        assert_eq!(
            split_resource("/apis/x.io/v1/widgets/foo").unwrap(),
            "widgets"
        );
    }

    #[test]
    fn test_cluster_too_short() {
        assert!(split_resource("/apis/x.io/v1").is_err());
        assert!(split_resource("/apis").is_err());
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        assert_eq!(split_resource("/apis/x.io/v1/widgets/").unwrap(), "widgets");
    }

    #[test]
    fn test_is_namespaced() {
        assert!(is_namespaced("/apis/x.io/v1/namespaces/team-a/widgets"));
        assert!(!is_namespaced("/apis/x.io/v1/widgets"));
        assert!(!is_namespaced("/apis/x.io/v1"));
    }
}
