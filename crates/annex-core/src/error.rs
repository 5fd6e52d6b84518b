use miette::Diagnostic;
use thiserror::Error;

/// Core error type for Annex operations
#[derive(Error, Debug, Diagnostic)]
pub enum AnnexError {
    /// A resource name was registered twice under the same GroupVersion
    #[error("Resource already registered: {resource} under {group_version}")]
    #[diagnostic(
        code(annex::duplicate_resource),
        help("Each resource name may be registered at most once per group/version; discovery documents must never list a resource twice")
    )]
    DuplicateResource {
        group_version: String,
        resource: String,
    },

    /// A request path did not match either supported URL shape
    #[error("Malformed request path: {path}")]
    #[diagnostic(
        code(annex::malformed_path),
        help("Expected /apis/{{group}}/{{version}}/namespaces/{{namespace}}/{{resource}}[/{{name}}] or /apis/{{group}}/{{version}}/{{resource}}[/{{name}}]")
    )]
    MalformedPath { path: String },

    /// No acceptable response media type
    #[error("No serializer available for Accept: {accept}")]
    #[diagnostic(
        code(annex::not_acceptable),
        help("Supported media types are application/json and application/yaml")
    )]
    NotAcceptable { accept: String },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(annex::serialization_error),
        help("Ensure the payload is valid JSON or YAML")
    )]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for Annex operations
pub type Result<T> = std::result::Result<T, AnnexError>;

impl AnnexError {
    /// Create a DuplicateResource error
    pub fn duplicate_resource(
        group_version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self::DuplicateResource {
            group_version: group_version.into(),
            resource: resource.into(),
        }
    }

    /// Create a MalformedPath error
    pub fn malformed_path(path: impl Into<String>) -> Self {
        Self::MalformedPath { path: path.into() }
    }

    /// Create a NotAcceptable error
    pub fn not_acceptable(accept: impl Into<String>) -> Self {
        Self::NotAcceptable {
            accept: accept.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }
}
