use crate::admission::{AdmissionReviewer, AllowAll};
use crate::registry::Registry;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Registered resource kinds and their handlers
    pub registry: Arc<Registry>,

    /// Reviewer backing the mutating admission endpoint
    pub mutating: Arc<dyn AdmissionReviewer>,

    /// Reviewer backing the validating admission endpoint
    pub validating: Arc<dyn AdmissionReviewer>,
}

impl AppState {
    /// Create state with allow-everything admission reviewers
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            mutating: Arc::new(AllowAll),
            validating: Arc::new(AllowAll),
        }
    }

    /// Create state with custom admission reviewers
    pub fn with_admission(
        registry: Arc<Registry>,
        mutating: Arc<dyn AdmissionReviewer>,
        validating: Arc<dyn AdmissionReviewer>,
    ) -> Self {
        Self {
            registry,
            mutating,
            validating,
        }
    }
}
