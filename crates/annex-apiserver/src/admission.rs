//! Mutating/validating admission endpoint pair.
//!
//! The gateway posts an `AdmissionReview` to `/mutating` and `/validating`
//! before persisting an object. The review rules themselves are pluggable
//! capabilities; this module only provides the wire plumbing and two trivial
//! reviewers.

use crate::error::ApiError;
use crate::state::AppState;
use annex_core::Status;
use axum::extract::State;
use axum::Json;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// AdmissionReview wire envelope (admission.k8s.io/v1)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    /// Wrap a response in the review envelope
    pub fn reply(response: AdmissionResponse) -> Self {
        Self {
            kind: "AdmissionReview".to_string(),
            api_version: "admission.k8s.io/v1".to_string(),
            request: None,
            response: Some(response),
        }
    }
}

/// The object under review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<serde_json::Value>,
}

/// The verdict, echoing the request UID
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Base64-encoded JSON patch, set by mutating reviewers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<String>,
}

impl AdmissionResponse {
    /// Allow the object unchanged
    pub fn allowed(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            allowed: true,
            status: None,
            patch: None,
            patch_type: None,
        }
    }

    /// Deny the object with a message
    pub fn denied(uid: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            allowed: false,
            status: Some(Status::failure(message, 403)),
            patch: None,
            patch_type: None,
        }
    }

    /// Allow the object with a JSON patch applied
    pub fn patched(uid: impl Into<String>, operations: &[JsonPatchOp]) -> Self {
        let patch = serde_json::to_vec(operations)
            .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
            .ok();

        Self {
            uid: uid.into(),
            allowed: true,
            status: None,
            patch_type: patch.as_ref().map(|_| "JSONPatch".to_string()),
            patch,
        }
    }
}

/// One JSON patch operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPatchOp {
    pub op: String,
    pub path: String,
    pub value: serde_json::Value,
}

impl JsonPatchOp {
    /// Create an "add" operation
    pub fn add(path: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            op: "add".to_string(),
            path: path.into(),
            value: value.into(),
        }
    }
}

/// A pluggable admission rule
pub trait AdmissionReviewer: Send + Sync {
    fn review(&self, request: &AdmissionRequest) -> AdmissionResponse;
}

/// Reviewer that admits every object unchanged
pub struct AllowAll;

impl AdmissionReviewer for AllowAll {
    fn review(&self, request: &AdmissionRequest) -> AdmissionResponse {
        AdmissionResponse::allowed(&request.uid)
    }
}

fn run_review(
    reviewer: &dyn AdmissionReviewer,
    review: AdmissionReview,
) -> Result<Json<AdmissionReview>, ApiError> {
    let request = review
        .request
        .ok_or_else(|| ApiError::BadRequest("AdmissionReview has no request".to_string()))?;

    debug!(
        uid = %request.uid,
        name = %request.name,
        operation = %request.operation,
        "Reviewing admission request"
    );

    let response = reviewer.review(&request);
    Ok(Json(AdmissionReview::reply(response)))
}

/// POST /mutating
pub(crate) async fn mutating_webhook(
    State(state): State<AppState>,
    Json(review): Json<AdmissionReview>,
) -> Result<Json<AdmissionReview>, ApiError> {
    run_review(state.mutating.as_ref(), review)
}

/// POST /validating
pub(crate) async fn validating_webhook(
    State(state): State<AppState>,
    Json(review): Json<AdmissionReview>,
) -> Result<Json<AdmissionReview>, ApiError> {
    run_review(state.validating.as_ref(), review)
}
