//! Fallback handler that relays gated requests to the event application.

use crate::api::common::service_error_to_http;
use crate::services::upstream::UpstreamClient;
use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
};

/// Forwards any request no local route handles.
pub async fn proxy(State(upstream): State<UpstreamClient>, request: Request) -> Response {
    match upstream.forward(request).await {
        Ok(response) => response,
        Err(error) => service_error_to_http(error).into_response(),
    }
}
