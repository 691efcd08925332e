//! Client for the token verification endpoint.
//!
//! The gate talks to `/api/tokenverify` through the `TokenVerifier` trait so
//! that route rules can be exercised without a network. `HttpTokenVerifier` is
//! the production implementation and owns the call timeout.

use crate::auth::models::{Role, TokenVerifyBody, VerificationResult};
use crate::errors::GateError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const CONNECT_TIMEOUT_SECS: u64 = 2;

/// Asks an external authority whether a bearer credential is valid.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies the credential carried by `authorization` (a full
    /// `Bearer <token>` header value, forwarded unchanged).
    ///
    /// A non-200 answer is a successful call with `valid == false`. `Err` is
    /// reserved for calls that produced no usable answer.
    async fn verify(&self, authorization: &str) -> Result<VerificationResult, GateError>;
}

/// Verifies tokens with `GET <verify_url>`.
#[derive(Clone)]
pub struct HttpTokenVerifier {
    client: Client,
    verify_url: String,
}

impl HttpTokenVerifier {
    /// Builds a verifier whose calls give up after `timeout`.
    pub fn new(verify_url: impl Into<String>, timeout: Duration) -> Result<Self, GateError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .map_err(|e| {
                error!(target: "gate.verifier", error = %e, "Failed to build HTTP client");
                GateError::VerificationUnreachable(e.to_string())
            })?;

        Ok(Self {
            client,
            verify_url: verify_url.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    #[instrument(skip_all, name = "gate.verifier.verify")]
    async fn verify(&self, authorization: &str) -> Result<VerificationResult, GateError> {
        let response = self
            .client
            .get(&self.verify_url)
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "verification request timed out".to_string()
                } else {
                    e.to_string()
                };
                warn!(target: "gate.verifier", error = %reason, "Token verification call failed");
                GateError::VerificationUnreachable(reason)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(target: "gate.verifier", status = status.as_u16(), "Token rejected");
            return Ok(VerificationResult::rejected(status.as_u16()));
        }

        let body = response.json::<TokenVerifyBody>().await.map_err(|e| {
            warn!(target: "gate.verifier", error = %e, "Undecodable verification body");
            GateError::MalformedVerification(e.to_string())
        })?;

        let role = body.kind.as_deref().and_then(Role::from_type);
        if role.is_none() {
            debug!(target: "gate.verifier", kind = ?body.kind, "Verified token has no recognised role");
        }

        Ok(VerificationResult::verified(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn unused_local_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}", port)
    }

    fn verifier_for(server: &MockServer, timeout: Duration) -> HttpTokenVerifier {
        HttpTokenVerifier::new(format!("{}/api/tokenverify", server.uri()), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_verify_forwards_header_and_decodes_role() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tokenverify"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "Admin"})))
            .expect(1)
            .mount(&server)
            .await;

        let verifier = verifier_for(&server, Duration::from_secs(5));
        let result = verifier.verify("Bearer abc").await.unwrap();

        assert_eq!(result, VerificationResult::verified(Some(Role::Admin)));
    }

    #[tokio::test]
    async fn test_verify_non_200_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tokenverify"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "expired"})))
            .mount(&server)
            .await;

        let verifier = verifier_for(&server, Duration::from_secs(5));
        let result = verifier.verify("Bearer stale").await.unwrap();

        assert!(!result.valid);
        assert_eq!(result.status, 403);
        assert_eq!(result.role, None);
    }

    #[tokio::test]
    async fn test_verify_unknown_role_is_valid_without_role() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "Guest"})))
            .mount(&server)
            .await;

        let verifier = verifier_for(&server, Duration::from_secs(5));
        let result = verifier.verify("Bearer abc").await.unwrap();

        assert_eq!(result, VerificationResult::verified(None));
    }

    #[tokio::test]
    async fn test_verify_malformed_body_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let verifier = verifier_for(&server, Duration::from_secs(5));
        let err = verifier.verify("Bearer abc").await.unwrap_err();

        assert!(matches!(err, GateError::MalformedVerification(_)));
    }

    #[tokio::test]
    async fn test_verify_timeout_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"type": "User"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let verifier = verifier_for(&server, Duration::from_millis(50));
        let err = verifier.verify("Bearer abc").await.unwrap_err();

        assert!(matches!(err, GateError::VerificationUnreachable(_)));
    }

    #[tokio::test]
    async fn test_verify_connection_refused_is_unreachable() {
        let url = format!("{}/api/tokenverify", unused_local_url());
        let verifier = HttpTokenVerifier::new(url, Duration::from_secs(1)).unwrap();
        let err = verifier.verify("Bearer abc").await.unwrap_err();

        assert!(matches!(err, GateError::VerificationUnreachable(_)));
    }
}
