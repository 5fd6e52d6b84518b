//! Resource handlers for the token kinds.

use crate::store::{SecretStore, StoreError};
use crate::token::{AccessToken, AccessTokenStatus, ClusterAccessToken, TokenList};
use annex_apiserver::response::{serialized_response, status_success};
use annex_apiserver::{ApiError, HandlerRequest, ResourceHandler, SerializerInfo, MEDIA_TYPE_JSON, MEDIA_TYPE_YAML};
use annex_core::Resource;
use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const MERGE_PATCH_MEDIA_TYPE: &str = "application/merge-patch+json";

fn respond(result: annex_apiserver::Result<Response>) -> Response {
    result.unwrap_or_else(|err| err.into_response())
}

/// Pick the decoder for a request payload from its Content-Type
fn payload_decoder(request: &HandlerRequest) -> SerializerInfo {
    let media_type = if request.content_type().contains("yaml") {
        MEDIA_TYPE_YAML
    } else {
        MEDIA_TYPE_JSON
    };
    SerializerInfo::from_media_type(media_type).expect("built-in media type")
}

/// Generate a fresh token value; returned to the caller exactly once
fn issue_token_value() -> String {
    format!("annex-{}", Uuid::new_v4().as_simple())
}

/// Handler for the namespaced `accesstokens` resource
pub struct TokenHandler {
    store: Arc<dyn SecretStore>,
}

impl TokenHandler {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    async fn get(&self, request: &HandlerRequest, namespace: &str) -> anyhow::Result<Response> {
        let info = match request.accepted_serializer() {
            Ok(info) => info,
            Err(err) => return Ok(ApiError::from(err).into_response()),
        };
        let name = request.last_path_segment().unwrap_or_default();

        match self.store.get(namespace, name).await {
            Ok(secret) => {
                let token = AccessToken::from_secret(&secret);
                Ok(respond(serialized_response(StatusCode::OK, &info, &token)))
            }
            Err(err @ StoreError::NotFound { .. }) => {
                Ok(ApiError::NotFound(err.to_string()).into_response())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create(&self, request: &HandlerRequest, namespace: &str) -> anyhow::Result<Response> {
        let info = match request.accepted_serializer() {
            Ok(info) => info,
            Err(err) => return Ok(ApiError::from(err).into_response()),
        };

        let mut token: AccessToken = match payload_decoder(request).decode(&request.body) {
            Ok(token) => token,
            Err(err) => {
                return Ok(
                    ApiError::BadRequest(format!("invalid token payload: {}", err)).into_response(),
                )
            }
        };

        token.metadata.namespace = Some(namespace.to_string());
        if let Err(err) = token.validate() {
            return Ok(ApiError::BadRequest(err.to_string()).into_response());
        }

        token.set_uid(Uuid::new_v4().to_string());
        token.metadata.creation_timestamp = Some(Time(Utc::now()));

        let value = issue_token_value();
        token.status = Some(AccessTokenStatus {
            hashed_token: value.clone(),
            plaintext_token: Some(value),
        });

        match self.store.create(namespace, token.to_secret()).await {
            Ok(_) => {}
            Err(err @ StoreError::AlreadyExists { .. }) => {
                return Ok(ApiError::Conflict(err.to_string()).into_response())
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            namespace = %namespace,
            name = token.name().unwrap_or_default(),
            "Issued access token"
        );

        Ok(respond(serialized_response(
            StatusCode::CREATED,
            &info,
            &token,
        )))
    }

    async fn delete(&self, request: &HandlerRequest, namespace: &str) -> anyhow::Result<Response> {
        let info = match request.accepted_serializer() {
            Ok(info) => info,
            Err(err) => return Ok(ApiError::from(err).into_response()),
        };
        let name = request.last_path_segment().unwrap_or_default();

        match self.store.delete(namespace, name).await {
            Ok(()) => {
                info!(namespace = %namespace, name = %name, "Revoked access token");
                Ok(respond(status_success(
                    &info,
                    &format!("accesstoken {} deleted", name),
                )))
            }
            Err(err @ StoreError::NotFound { .. }) => {
                Ok(ApiError::NotFound(err.to_string()).into_response())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn patch(&self, request: &HandlerRequest, namespace: &str) -> anyhow::Result<Response> {
        if request.content_type() != MERGE_PATCH_MEDIA_TYPE {
            return Ok(ApiError::UnsupportedMediaType(format!(
                "unsupported patch type: {:?}",
                request.content_type()
            ))
            .into_response());
        }

        let info = match request.accepted_serializer() {
            Ok(info) => info,
            Err(err) => return Ok(ApiError::from(err).into_response()),
        };

        let patch: serde_json::Value = match serde_json::from_slice(&request.body) {
            Ok(patch) => patch,
            Err(err) => {
                return Ok(
                    ApiError::BadRequest(format!("invalid merge patch: {}", err)).into_response(),
                )
            }
        };

        let name = request.last_path_segment().unwrap_or_default();
        let secret = match self.store.get(namespace, name).await {
            Ok(secret) => secret,
            Err(err @ StoreError::NotFound { .. }) => {
                return Ok(ApiError::NotFound(err.to_string()).into_response())
            }
            Err(err) => return Err(err.into()),
        };

        let token = AccessToken::from_secret(&secret);
        let mut token_json = serde_json::to_value(&token)?;
        json_patch::merge(&mut token_json, &patch);

        let mut token: AccessToken = match serde_json::from_value(token_json) {
            Ok(token) => token,
            Err(err) => {
                return Ok(
                    ApiError::BadRequest(format!("invalid merge patch: {}", err)).into_response(),
                )
            }
        };

        // Identity is taken from the path, not the patch body
        token.metadata.namespace = Some(namespace.to_string());
        token.metadata.name = Some(name.to_string());

        self.store.upsert(namespace, token.to_secret()).await?;

        info!(namespace = %namespace, name = %name, "Patched access token");

        Ok(respond(serialized_response(StatusCode::OK, &info, &token)))
    }
}

#[async_trait]
impl ResourceHandler for TokenHandler {
    async fn handle(&self, request: HandlerRequest) -> anyhow::Result<Response> {
        let namespace = request.namespace.clone().unwrap_or_default();

        match request.method {
            Method::GET => self.get(&request, &namespace).await,
            Method::POST => self.create(&request, &namespace).await,
            Method::DELETE => self.delete(&request, &namespace).await,
            Method::PATCH => self.patch(&request, &namespace).await,
            ref method => Ok(ApiError::MethodNotAllowed(format!(
                "{} is not supported on accesstokens",
                method
            ))
            .into_response()),
        }
    }
}

/// Handler for the cluster-scoped `clusteraccesstokens` resource
pub struct ClusterTokenHandler {
    store: Arc<dyn SecretStore>,
}

impl ClusterTokenHandler {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    async fn list(&self, request: &HandlerRequest) -> anyhow::Result<Response> {
        let info = match request.accepted_serializer() {
            Ok(info) => info,
            Err(err) => return Ok(ApiError::from(err).into_response()),
        };

        let secrets = self.store.list("").await?;
        let tokens: Vec<_> = secrets
            .iter()
            .map(ClusterAccessToken::from_secret)
            .collect();
        let list = TokenList::new("ClusterAccessTokenList", tokens);

        Ok(respond(serialized_response(StatusCode::OK, &info, &list)))
    }

    async fn get(&self, request: &HandlerRequest, name: &str) -> anyhow::Result<Response> {
        let info = match request.accepted_serializer() {
            Ok(info) => info,
            Err(err) => return Ok(ApiError::from(err).into_response()),
        };

        match self.store.get("", name).await {
            Ok(secret) => {
                let token = ClusterAccessToken::from_secret(&secret);
                Ok(respond(serialized_response(StatusCode::OK, &info, &token)))
            }
            Err(err @ StoreError::NotFound { .. }) => {
                Ok(ApiError::NotFound(err.to_string()).into_response())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn create(&self, request: &HandlerRequest) -> anyhow::Result<Response> {
        let info = match request.accepted_serializer() {
            Ok(info) => info,
            Err(err) => return Ok(ApiError::from(err).into_response()),
        };

        let mut token: ClusterAccessToken = match payload_decoder(request).decode(&request.body) {
            Ok(token) => token,
            Err(err) => {
                return Ok(
                    ApiError::BadRequest(format!("invalid token payload: {}", err)).into_response(),
                )
            }
        };

        if let Err(err) = token.validate() {
            return Ok(ApiError::BadRequest(err.to_string()).into_response());
        }

        token.set_uid(Uuid::new_v4().to_string());
        token.metadata.creation_timestamp = Some(Time(Utc::now()));

        let value = issue_token_value();
        token.status = Some(AccessTokenStatus {
            hashed_token: value.clone(),
            plaintext_token: Some(value),
        });

        match self.store.create("", token.to_secret()).await {
            Ok(_) => {}
            Err(err @ StoreError::AlreadyExists { .. }) => {
                return Ok(ApiError::Conflict(err.to_string()).into_response())
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            name = token.name().unwrap_or_default(),
            "Issued cluster access token"
        );

        Ok(respond(serialized_response(
            StatusCode::CREATED,
            &info,
            &token,
        )))
    }
}

#[async_trait]
impl ResourceHandler for ClusterTokenHandler {
    async fn handle(&self, request: HandlerRequest) -> anyhow::Result<Response> {
        match request.method {
            Method::GET => {
                // Bare resource path lists; a trailing name reads one token
                match request.last_path_segment() {
                    Some("clusteraccesstokens") | None => self.list(&request).await,
                    Some(name) => {
                        let name = name.to_string();
                        self.get(&request, &name).await
                    }
                }
            }
            Method::POST => self.create(&request).await,
            ref method => Ok(ApiError::MethodNotAllowed(format!(
                "{} is not supported on clusteraccesstokens",
                method
            ))
            .into_response()),
        }
    }
}
