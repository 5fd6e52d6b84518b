use crate::admission::{mutating_webhook, validating_webhook, AdmissionReviewer};
use crate::error::ApiError;
use crate::handler::HandlerRequest;
use crate::negotiate::{accepted_serializer, MEDIA_TYPE_JSON, SUPPORTED_MEDIA_TYPES};
use crate::openapi::{openapi_v2, openapi_v3};
use crate::path;
use crate::registry::{HandlerScope, Registry};
use crate::response::serialized_response;
use crate::state::AppState;
use crate::tls::{resolve_tls, TlsMode};
use annex_core::GroupVersion;
use axum::body::to_bytes;
use axum::extract::{Path, Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use miette::IntoDiagnostic;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Largest request body a handler can be asked to buffer
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// API server configuration
#[derive(Clone)]
pub struct Config {
    /// Address to listen on
    pub listen_addr: SocketAddr,
    /// TLS material source for the listener
    pub tls: TlsMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:9443".parse().expect("valid default address"),
            tls: TlsMode::Disabled,
        }
    }
}

/// API extension server.
///
/// Serves per-GroupVersion discovery documents and dispatches typed resource
/// requests to the handlers registered in its [`Registry`]. The registry is
/// consulted live on every request, so resources registered after startup
/// are served without rebinding any routes.
pub struct ApiServer {
    config: Config,
    state: AppState,
}

impl ApiServer {
    /// Create a new API server over the given registry
    pub fn new(config: Config, registry: Arc<Registry>) -> Self {
        Self {
            config,
            state: AppState::new(registry),
        }
    }

    /// Replace the admission reviewers backing /mutating and /validating
    pub fn with_admission(
        mut self,
        mutating: Arc<dyn AdmissionReviewer>,
        validating: Arc<dyn AdmissionReviewer>,
    ) -> Self {
        self.state = AppState::with_admission(self.state.registry.clone(), mutating, validating);
        self
    }

    /// Build the router
    fn build_router(&self) -> Router {
        Router::new()
            // Aggregated discovery is the parent gateway's job
            .route("/apis", any(top_level_discovery))
            // Per-GroupVersion discovery and resource dispatch
            .route("/apis/{group}/{version}", any(discovery))
            .route("/apis/{group}/{version}/{*rest}", any(dispatch))
            // OpenAPI stubs for the aggregator
            .route("/openapi/v2", get(openapi_v2))
            .route("/openapi/v3", get(openapi_v3))
            // Admission endpoint pair
            .route("/mutating", post(mutating_webhook))
            .route("/validating", post(validating_webhook))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server
    pub async fn run(self) -> miette::Result<()> {
        let app = self.build_router();

        match resolve_tls(&self.config.tls)? {
            Some(material) => {
                info!("Starting API server (TLS) on {}", self.config.listen_addr);

                let rustls = RustlsConfig::from_pem(material.cert_pem, material.key_pem)
                    .await
                    .into_diagnostic()?;
                axum_server::bind_rustls(self.config.listen_addr, rustls)
                    .serve(app.into_make_service())
                    .await
                    .into_diagnostic()?;
            }
            None => {
                info!("Starting API server on {}", self.config.listen_addr);

                let listener = TcpListener::bind(self.config.listen_addr)
                    .await
                    .into_diagnostic()?;
                axum::serve(listener, app).await.into_diagnostic()?;
            }
        }

        Ok(())
    }
}

/// Any /apis: top-level discovery aggregation is not served by a delegate;
/// aggregation clients expect 406 here
async fn top_level_discovery() -> Response {
    (
        StatusCode::NOT_ACCEPTABLE,
        [(header::CONTENT_TYPE, MEDIA_TYPE_JSON)],
    )
        .into_response()
}

/// GET /apis/{group}/{version}: the GroupVersion's discovery document
async fn discovery(
    State(state): State<AppState>,
    Path((group, version)): Path<(String, String)>,
    request: Request,
) -> Response {
    serve_discovery(&state, group, version, &request).unwrap_or_else(IntoResponse::into_response)
}

fn serve_discovery(
    state: &AppState,
    group: String,
    version: String,
    request: &Request,
) -> Result<Response, ApiError> {
    if request.method() != Method::GET {
        return Err(ApiError::NotFound(format!(
            "{} is not supported on discovery paths",
            request.method()
        )));
    }

    let group_version = GroupVersion::new(group, version);
    let list = state
        .registry
        .discovery_list(&group_version)
        .ok_or_else(|| {
            ApiError::NotFound(format!("no resources registered under {}", group_version))
        })?;

    let accept = request
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let info = accepted_serializer(accept, SUPPORTED_MEDIA_TYPES)?;

    debug!(groupversion = %group_version, media_type = %info.media_type, "Serving discovery document");

    // `list` is an owned snapshot, so encoding cannot observe registry state
    serialized_response(StatusCode::OK, &info, &list)
}

/// All methods on /apis/{group}/{version}/...: resolve a handler and
/// delegate the rest of the request lifecycle to it
async fn dispatch(
    State(state): State<AppState>,
    Path((group, version, _rest)): Path<(String, String, String)>,
    request: Request,
) -> Response {
    let group_version = GroupVersion::new(group, version);
    let request_path = request.uri().path().to_string();

    // Parse failures are answered exactly like unknown resources
    let (namespace, resource) = if path::is_namespaced(&request_path) {
        match path::split_namespace_resource(&request_path) {
            Ok(parsed) => (Some(parsed.namespace), parsed.resource),
            Err(err) => return ApiError::from(err).into_response(),
        }
    } else {
        match path::split_resource(&request_path) {
            Ok(resource) => (None, resource),
            Err(err) => return ApiError::from(err).into_response(),
        }
    };

    let scope = if namespace.is_some() {
        HandlerScope::Namespaced
    } else {
        HandlerScope::Cluster
    };

    let gvr = group_version.with_resource(&resource);
    let Some(handler) = state.registry.handler_for(&gvr, scope) else {
        return ApiError::NotFound(format!("no handler registered for {}", gvr)).into_response();
    };

    debug!(gvr = %gvr, namespace = ?namespace, method = %request.method(), "Dispatching to resource handler");

    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            return ApiError::BadRequest(format!("failed to read request body: {}", err))
                .into_response()
        }
    };

    let handler_request = HandlerRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
        namespace,
    };

    match handler.handle(handler_request).await {
        Ok(response) => response,
        // Handler errors are opaque to the router; only the message crosses
        Err(err) => ApiError::Internal(err.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ResourceHandler;
    use annex_core::ApiResource;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    struct EchoHandler;

    #[async_trait]
    impl ResourceHandler for EchoHandler {
        async fn handle(&self, request: HandlerRequest) -> anyhow::Result<Response> {
            let body = serde_json::json!({
                "namespace": request.namespace,
                "path": request.path(),
                "method": request.method.as_str(),
            });
            Ok(axum::Json(body).into_response())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ResourceHandler for FailingHandler {
        async fn handle(&self, _request: HandlerRequest) -> anyhow::Result<Response> {
            anyhow::bail!("backing store unavailable")
        }
    }

    fn server_with_widgets() -> Router {
        let registry = Arc::new(Registry::new());
        let gv = GroupVersion::new("x.io", "v1");
        registry
            .register(
                gv.clone(),
                ApiResource::new("widgets", "widget", true, "Widget", &["get", "create"]),
                Arc::new(EchoHandler),
            )
            .unwrap();
        registry
            .register(
                gv,
                ApiResource::new("globals", "global", false, "Global", &["get"]),
                Arc::new(EchoHandler),
            )
            .unwrap();

        ApiServer::new(Config::default(), registry).build_router()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(path: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_top_level_discovery_is_406() {
        let app = server_with_widgets();

        for method in [Method::GET, Method::POST, Method::DELETE] {
            let request = HttpRequest::builder()
                .method(method)
                .uri("/apis")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
            assert_eq!(
                response.headers().get(header::CONTENT_TYPE).unwrap(),
                MEDIA_TYPE_JSON
            );
        }
    }

    #[tokio::test]
    async fn test_discovery_document_shape() {
        let app = server_with_widgets();

        let response = app.oneshot(get("/apis/x.io/v1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            MEDIA_TYPE_JSON
        );

        let json = body_json(response).await;
        assert_eq!(json["kind"], "APIResourceList");
        assert_eq!(json["groupVersion"], "x.io/v1");
        assert_eq!(json["resources"][0]["name"], "widgets");
        assert_eq!(json["resources"][0]["namespaced"], true);
        assert_eq!(json["resources"][1]["name"], "globals");
    }

    #[tokio::test]
    async fn test_discovery_reflects_late_registration() {
        let registry = Arc::new(Registry::new());
        let gv = GroupVersion::new("x.io", "v1");
        registry
            .register(
                gv.clone(),
                ApiResource::new("widgets", "widget", true, "Widget", &["get"]),
                Arc::new(EchoHandler),
            )
            .unwrap();

        let app = ApiServer::new(Config::default(), registry.clone()).build_router();

        let json = body_json(app.clone().oneshot(get("/apis/x.io/v1")).await.unwrap()).await;
        assert_eq!(json["resources"].as_array().unwrap().len(), 1);

        registry
            .register(
                gv,
                ApiResource::new("gadgets", "gadget", true, "Gadget", &["get"]),
                Arc::new(EchoHandler),
            )
            .unwrap();

        let json = body_json(app.oneshot(get("/apis/x.io/v1")).await.unwrap()).await;
        let names: Vec<_> = json["resources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["widgets", "gadgets"]);
    }

    #[tokio::test]
    async fn test_discovery_yaml_negotiation() {
        let app = server_with_widgets();

        let request = HttpRequest::builder()
            .uri("/apis/x.io/v1")
            .header(header::ACCEPT, "application/yaml")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/yaml"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("groupVersion: x.io/v1"));
    }

    #[tokio::test]
    async fn test_discovery_unknown_group_version_404() {
        let app = server_with_widgets();
        let response = app.oneshot(get("/apis/unknown.io/v9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_discovery_post_is_404() {
        let app = server_with_widgets();
        let request = HttpRequest::builder()
            .method(Method::POST)
            .uri("/apis/x.io/v1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_namespaced_dispatch_passes_namespace() {
        let app = server_with_widgets();

        let response = app
            .oneshot(get("/apis/x.io/v1/namespaces/team-a/widgets/foo"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["namespace"], "team-a");
        assert_eq!(json["path"], "/apis/x.io/v1/namespaces/team-a/widgets/foo");
    }

    #[tokio::test]
    async fn test_cluster_dispatch_has_no_namespace() {
        let app = server_with_widgets();

        let response = app.oneshot(get("/apis/x.io/v1/globals/main")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["namespace"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_unregistered_resource_404_for_all_methods() {
        let app = server_with_widgets();

        for method in [Method::GET, Method::POST, Method::PATCH, Method::DELETE] {
            let request = HttpRequest::builder()
                .method(method.clone())
                .uri("/apis/x.io/v1/doodads/foo")
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "method {}", method);
        }
    }

    #[tokio::test]
    async fn test_scope_mismatch_is_404() {
        let app = server_with_widgets();

        // widgets is namespaced; the cluster shape must not find it
        let response = app.clone().oneshot(get("/apis/x.io/v1/widgets")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // globals is cluster-scoped; the namespaced shape must not find it
        let response = app
            .oneshot(get("/apis/x.io/v1/namespaces/team-a/globals/main"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_namespaced_path_is_404() {
        let app = server_with_widgets();

        let response = app
            .oneshot(get("/apis/x.io/v1/namespaces/team-a"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["kind"], "Status");
        assert_eq!(json["status"], "Failure");
    }

    #[tokio::test]
    async fn test_handler_error_maps_to_500() {
        let registry = Arc::new(Registry::new());
        registry
            .register(
                GroupVersion::new("x.io", "v1"),
                ApiResource::new("widgets", "widget", true, "Widget", &["get"]),
                Arc::new(FailingHandler),
            )
            .unwrap();
        let app = ApiServer::new(Config::default(), registry).build_router();

        let response = app
            .oneshot(get("/apis/x.io/v1/namespaces/team-a/widgets/foo"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["status"], "Failure");
        assert_eq!(json["message"], "backing store unavailable");
    }

    #[tokio::test]
    async fn test_admission_endpoints_allow_by_default() {
        let app = server_with_widgets();

        let review = serde_json::json!({
            "kind": "AdmissionReview",
            "apiVersion": "admission.k8s.io/v1",
            "request": {"uid": "uid-9", "name": "thing", "operation": "CREATE"}
        });
        let request = HttpRequest::builder()
            .method(Method::POST)
            .uri("/validating")
            .header(header::CONTENT_TYPE, MEDIA_TYPE_JSON)
            .body(Body::from(review.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["response"]["uid"], "uid-9");
        assert_eq!(json["response"]["allowed"], true);
    }

    #[tokio::test]
    async fn test_openapi_v3_lists_registered_group_versions() {
        let app = server_with_widgets();
        let response = app.oneshot(get("/openapi/v3")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json["paths"].get("apis/x.io/v1").is_some());
    }
}
