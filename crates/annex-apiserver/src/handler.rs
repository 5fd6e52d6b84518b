//! The pluggable per-resource-kind handler contract.

use crate::negotiate::{accepted_serializer, SerializerInfo, SUPPORTED_MEDIA_TYPES};
use async_trait::async_trait;
use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::Response;
use bytes::Bytes;

/// A parsed, buffered request handed to a resource handler.
///
/// The router has already matched the resource and scope; everything else
/// about the request/response lifecycle belongs to the handler, including
/// negotiating the format of its own payload.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Namespace from the path; `None` for cluster-scoped dispatch
    pub namespace: Option<String>,
}

impl HandlerRequest {
    /// Get the request path
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Get the trailing path segment (the object name, when one is present)
    pub fn last_path_segment(&self) -> Option<&str> {
        self.path().trim_matches('/').rsplit('/').next()
    }

    /// Get the `Accept` header, or "" when absent
    pub fn accept_header(&self) -> &str {
        self.headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Get the `Content-Type` header, or "" when absent
    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Negotiate the response serializer for this request
    pub fn accepted_serializer(&self) -> annex_core::Result<SerializerInfo> {
        accepted_serializer(self.accept_header(), SUPPORTED_MEDIA_TYPES)
    }
}

/// One registered resource kind's request handler.
///
/// Implementations must be safe to invoke concurrently; the router holds a
/// shared reference and provides no per-resource locking. An `Err` return is
/// treated as opaque by the router and surfaced as a 500 with the error's
/// message; handlers that want a specific status code return `Ok` with a
/// response carrying it.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn handle(&self, request: HandlerRequest) -> anyhow::Result<Response>;
}
