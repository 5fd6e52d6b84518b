//! OpenAPI discovery stubs.
//!
//! The aggregating gateway probes `/openapi/v2` and `/openapi/v3` on every
//! delegate. Full schema publication is not supported; these endpoints serve
//! the minimal documents the aggregator tolerates, with the v3 discovery map
//! derived from the live registry.

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

/// GET /openapi/v2
pub(crate) async fn openapi_v2() -> Json<Value> {
    Json(json!({
        "swagger": "2.0",
        "info": {
            "title": "annex",
            "version": "v0.1.0"
        },
        "paths": {},
        "definitions": {}
    }))
}

/// GET /openapi/v3
pub(crate) async fn openapi_v3(State(state): State<AppState>) -> Json<Value> {
    let mut paths = serde_json::Map::new();
    for group_version in state.registry.group_versions() {
        let key = format!("apis/{}", group_version);
        paths.insert(
            key.clone(),
            json!({ "serverRelativeURL": format!("/openapi/v3/{}", key) }),
        );
    }

    Json(json!({ "paths": paths }))
}
