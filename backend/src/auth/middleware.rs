//! Middleware that puts the request gate in front of every route.
//!
//! Builds a `GateRequest` from the inbound request, evaluates it, and either
//! forwards the request or answers it directly.

use crate::auth::cors::{cors_headers, merge_cors};
use crate::auth::gate::{Gate, GateDecision};
use crate::auth::request::GateRequest;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

/// Gate middleware, installed with `middleware::from_fn_with_state`.
///
/// Forwarded requests carry the CORS headers, and so does every response,
/// whether it comes from the gate or from the inner service.
pub async fn request_gate(
    State(gate): State<Arc<Gate>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let decision = gate.evaluate(&GateRequest::from_parts(&parts)).await;

    match decision {
        GateDecision::Continue => {
            merge_cors(&mut parts.headers);
            let mut response = next.run(Request::from_parts(parts, body)).await;
            merge_cors(response.headers_mut());
            response
        }
        GateDecision::Preflight => (StatusCode::OK, cors_headers()).into_response(),
        GateDecision::Reject { status, body } => {
            (status, cors_headers(), Json(body)).into_response()
        }
        GateDecision::Redirect { location } => {
            (cors_headers(), Redirect::temporary(&location)).into_response()
        }
    }
}
