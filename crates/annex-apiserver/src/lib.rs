//! Annex API Server - Kubernetes API extension surface
//!
//! This crate provides:
//! - A registry of pluggable resource kinds, keyed by group/version/resource
//! - Per-GroupVersion discovery documents for the aggregating gateway
//! - Request routing for namespaced and cluster-scoped resource paths
//! - `Accept`-header content negotiation (JSON and YAML)
//! - Mutating/validating admission webhook plumbing

pub mod admission;
pub mod error;
pub mod handler;
pub mod negotiate;
pub mod openapi;
pub mod path;
pub mod registry;
pub mod response;
pub mod server;
pub mod state;
pub mod tls;

// Re-export commonly used types
pub use error::{ApiError, Result};
pub use handler::{HandlerRequest, ResourceHandler};
pub use negotiate::{
    accepted_serializer, SerializerInfo, WireFormat, MEDIA_TYPE_JSON, MEDIA_TYPE_YAML,
    SUPPORTED_MEDIA_TYPES,
};
pub use registry::{HandlerScope, Registry};
pub use server::{ApiServer, Config};
pub use state::AppState;
pub use tls::TlsMode;
