//! Router assembly: local routes, the upstream fallback, and the request gate
//! wrapped around all of them.

use crate::api::common::ApiResponse;
use crate::api::proxy::proxy;
use crate::auth::gate::Gate;
use crate::auth::middleware::request_gate;
use crate::services::upstream::UpstreamClient;
use axum::{Json, Router, middleware, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;

/// Builds the application router. The gate runs before every route,
/// including the fallback proxy.
pub fn app_router(gate: Arc<Gate>, upstream: UpstreamClient) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(proxy)
        .with_state(upstream)
        .layer(middleware::from_fn_with_state(gate, request_gate))
}

async fn health_handler() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Event gate is running",
    ))
}
