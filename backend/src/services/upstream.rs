//! Forwards requests that passed the gate to the event application.

use crate::errors::{ServiceError, ServiceResult};
use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Request, Response, header};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::time::Duration;
use tracing::{debug, warn};

/// Largest request body forwarded upstream.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Headers that describe a single hop and are never copied across. Headers
/// named in `Connection` are dropped as well.
const HOP_BY_HOP: [HeaderName; 10] = [
    header::HOST,
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::CONTENT_LENGTH,
    header::UPGRADE,
];

/// HTTP client bound to the upstream event application.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ServiceResult<Self> {
        // Upstream redirects go back to the browser untouched.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ServiceError::internal_error(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Sends `request` to the same path and query on the upstream origin and
    /// relays the answer.
    pub async fn forward(&self, request: Request<Body>) -> ServiceResult<Response<Body>> {
        let (parts, body) = request.into_parts();
        let target_url = match parts.uri.path_and_query() {
            Some(path_and_query) => format!("{}{}", self.base_url, path_and_query),
            None => format!("{}{}", self.base_url, parts.uri.path()),
        };

        let body_bytes = Limited::new(body, MAX_BODY_BYTES)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    ServiceError::payload_too_large(MAX_BODY_BYTES)
                } else {
                    warn!(error = %e, "Failed to read request body");
                    ServiceError::validation(format!("Request body rejected: {}", e))
                }
            })?
            .to_bytes();

        let mut upstream_request = self
            .client
            .request(parts.method.clone(), &target_url)
            .headers(end_to_end(&parts.headers));
        if !body_bytes.is_empty() {
            upstream_request = upstream_request.body(body_bytes);
        }

        let upstream_response = upstream_request.send().await.map_err(|e| {
            warn!(target_url = %target_url, error = %e, "Upstream request failed");
            ServiceError::external_service("Event application is unavailable")
        })?;

        let status = upstream_response.status();
        let headers = end_to_end(upstream_response.headers());
        let bytes = upstream_response.bytes().await.map_err(|e| {
            warn!(target_url = %target_url, error = %e, "Failed to read upstream response");
            ServiceError::external_service("Event application response was interrupted")
        })?;

        debug!(method = %parts.method, target_url = %target_url, status = status.as_u16(), "Proxied request");

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = headers.clone();
    let named_in_connection: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    for name in HOP_BY_HOP.into_iter().chain(named_in_connection) {
        filtered.remove(name);
    }
    filtered
}
