//! The gate's read-only view of an inbound request.

use crate::auth::models::BearerToken;
use axum::http::{
    HeaderMap, Method,
    header::{AUTHORIZATION, COOKIE},
    request::Parts,
};
use std::collections::HashMap;

/// Name of the cookie carrying the UI session credential.
pub const TOKEN_COOKIE: &str = "token";

/// Method, path, headers and cookies of the request being evaluated.
#[derive(Debug, Clone)]
pub struct GateRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub cookies: HashMap<String, String>,
}

impl GateRequest {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        let cookies = parse_cookies(&headers);
        Self {
            method,
            path: path.into(),
            headers,
            cookies,
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(
            parts.method.clone(),
            parts.uri.path(),
            parts.headers.clone(),
        )
    }

    /// Raw `Authorization` header, if it is valid UTF-8.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
    }

    /// True when any path segment is `.` or `..`, literally or
    /// percent-encoded. URL parsing resolves such segments before the request
    /// leaves the proxy, so the gate refuses to classify them.
    pub fn has_dot_segments(&self) -> bool {
        self.path.split('/').any(is_dot_segment)
    }

    /// The credential from the `token` cookie. Empty values count as absent.
    pub fn token_cookie(&self) -> Option<BearerToken> {
        self.cookies
            .get(TOKEN_COOKIE)
            .filter(|value| !value.is_empty())
            .map(BearerToken::new)
    }
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Collects `name=value` pairs from every `Cookie` header. The first
/// occurrence of a name wins.
fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies
                    .entry(name.trim().to_string())
                    .or_insert_with(|| value.trim().trim_matches('"').to_string());
            }
        }
    }
    cookies
}
