//! The request gate: decides, for every inbound request, whether it passes,
//! is rejected, or is redirected.
//!
//! Classification is an ordered list of rules; the first rule whose predicate
//! matches produces the decision.
//!
//! | Order | Rule            | Outcome                                   |
//! |-------|-----------------|-------------------------------------------|
//! | 0     | `DotSegments`   | 400, path is never forwarded              |
//! | 1     | `Preflight`     | 200 with CORS headers                     |
//! | 2     | `AllowedPath`   | Continue                                  |
//! | 3     | `ApiBearer`     | Continue or 401 per bearer verification   |
//! | 4     | `AllowedPathUi` | Continue                                  |
//! | 5     | `UiSession`     | Cookie check and role redirect            |
//!
//! Prefix rules only hold if the upstream sees the same path the gate
//! classified, so paths with `.` or `..` segments are refused up front.
//!
//! Every verification failure is treated as "not authenticated". An
//! unauthenticated UI request continues only when it already targets the
//! login page.

use crate::auth::models::{BearerToken, Role};
use crate::auth::request::GateRequest;
use crate::auth::verifier::TokenVerifier;
use crate::config::RoutePolicy;
use crate::errors::GateError;
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

const API_PREFIX: &str = "/api";

/// Outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Forward the request with CORS headers merged in.
    Continue,
    /// Answer a CORS preflight: 200, empty body, CORS headers only.
    Preflight,
    /// Terminate with a JSON error.
    Reject { status: StatusCode, body: Value },
    /// Terminate with a redirect.
    Redirect { location: String },
}

impl GateDecision {
    pub fn unauthorized() -> Self {
        GateDecision::Reject {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "status": "Unauthorized" }),
        }
    }

    pub fn bad_request() -> Self {
        GateDecision::Reject {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "status": "Bad Request" }),
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        GateDecision::Redirect {
            location: location.into(),
        }
    }
}

/// One row of the route classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    DotSegments,
    Preflight,
    AllowedPath,
    ApiBearer,
    AllowedPathUi,
    UiSession,
}

impl Rule {
    /// Evaluation order; first match wins.
    pub const ORDER: [Rule; 6] = [
        Rule::DotSegments,
        Rule::Preflight,
        Rule::AllowedPath,
        Rule::ApiBearer,
        Rule::AllowedPathUi,
        Rule::UiSession,
    ];

    pub fn matches(self, request: &GateRequest, policy: &RoutePolicy) -> bool {
        match self {
            Rule::DotSegments => request.has_dot_segments(),
            Rule::Preflight => request.method == Method::OPTIONS,
            Rule::AllowedPath => policy.is_allowed(&request.path),
            Rule::ApiBearer => is_api(&request.path),
            Rule::AllowedPathUi => policy.is_allowed_ui(&request.path),
            Rule::UiSession => !is_api(&request.path),
        }
    }

    pub async fn apply(
        self,
        request: &GateRequest,
        policy: &RoutePolicy,
        verifier: &dyn TokenVerifier,
    ) -> GateDecision {
        match self {
            Rule::DotSegments => {
                info!(target: "gate", path = %request.path, "Rejecting path with dot segments");
                GateDecision::bad_request()
            }
            Rule::Preflight => GateDecision::Preflight,
            Rule::AllowedPath | Rule::AllowedPathUi => GateDecision::Continue,
            Rule::ApiBearer => authorize_api(request, verifier).await,
            Rule::UiSession => authenticate_ui(request, policy, verifier).await,
        }
    }
}

fn is_api(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}

/// Bearer check for API paths. Terminal: always Continue or 401.
async fn authorize_api(request: &GateRequest, verifier: &dyn TokenVerifier) -> GateDecision {
    let Some(authorization) = request
        .authorization()
        .filter(|header| BearerToken::from_authorization(header).is_some())
    else {
        debug!(target: "gate", path = %request.path, error = %GateError::MissingCredential, "Rejecting API request");
        return GateDecision::unauthorized();
    };

    match verifier.verify(authorization).await {
        Ok(result) if result.valid => GateDecision::Continue,
        Ok(result) => {
            let error = GateError::InvalidCredential {
                status: result.status,
            };
            info!(target: "gate", path = %request.path, error = %error, "Rejecting API request");
            GateDecision::unauthorized()
        }
        Err(error) => {
            warn!(target: "gate", path = %request.path, error = %error, "Rejecting API request");
            GateDecision::unauthorized()
        }
    }
}

/// Cookie check and role-based redirect for UI paths.
async fn authenticate_ui(
    request: &GateRequest,
    policy: &RoutePolicy,
    verifier: &dyn TokenVerifier,
) -> GateDecision {
    let Some(token) = request.token_cookie() else {
        return deny_ui(request, policy, GateError::MissingCredential);
    };

    let result = match verifier.verify(&token.authorization_value()).await {
        Ok(result) => result,
        Err(error) => return deny_ui(request, policy, error),
    };

    if !result.valid {
        return deny_ui(
            request,
            policy,
            GateError::InvalidCredential {
                status: result.status,
            },
        );
    }

    match result.role {
        Some(Role::Admin) if request.path != policy.admin_dashboard_path => {
            GateDecision::redirect(policy.admin_dashboard_path.clone())
        }
        Some(Role::User) if request.path != policy.user_dashboard_path => {
            GateDecision::redirect(policy.user_dashboard_path.clone())
        }
        _ => GateDecision::Continue,
    }
}

/// Sends an unauthenticated UI request to the login page, unless it is
/// already there.
fn deny_ui(request: &GateRequest, policy: &RoutePolicy, reason: GateError) -> GateDecision {
    if policy.is_login(&request.path) {
        debug!(target: "gate", error = %reason, "Unauthenticated request already on login page");
        return GateDecision::Continue;
    }
    debug!(target: "gate", path = %request.path, error = %reason, "Redirecting to login");
    GateDecision::redirect(policy.login_path.clone())
}

/// Route policy plus the verifier used to authenticate requests.
///
/// Holds no mutable state; one instance is shared by all requests.
pub struct Gate {
    policy: RoutePolicy,
    verifier: Arc<dyn TokenVerifier>,
}

impl Gate {
    pub fn new(policy: RoutePolicy, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { policy, verifier }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Classifies `request` and produces exactly one decision.
    pub async fn evaluate(&self, request: &GateRequest) -> GateDecision {
        for rule in Rule::ORDER {
            if rule.matches(request, &self.policy) {
                let decision = rule.apply(request, &self.policy, self.verifier.as_ref()).await;
                debug!(
                    target: "gate",
                    method = %request.method,
                    path = %request.path,
                    rule = ?rule,
                    decision = ?decision,
                    "Gate decision"
                );
                return decision;
            }
        }
        GateDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::VerificationResult;
    use crate::auth::test_support::StubVerifier;
    use axum::http::{HeaderMap, HeaderValue, header};

    fn gate(verifier: Arc<StubVerifier>) -> Gate {
        Gate::new(RoutePolicy::default(), verifier)
    }

    fn request(method: Method, path: &str) -> GateRequest {
        GateRequest::new(method, path, HeaderMap::new())
    }

    fn api_request(path: &str, authorization: &str) -> GateRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(authorization).unwrap(),
        );
        GateRequest::new(Method::GET, path, headers)
    }

    fn ui_request(path: &str, token: &str) -> GateRequest {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("token={}", token)).unwrap(),
        );
        GateRequest::new(Method::GET, path, headers)
    }

    #[test]
    fn test_rule_predicates() {
        let policy = RoutePolicy::default();

        assert!(Rule::Preflight.matches(&request(Method::OPTIONS, "/anything"), &policy));
        assert!(!Rule::Preflight.matches(&request(Method::GET, "/anything"), &policy));

        assert!(Rule::AllowedPath.matches(&request(Method::GET, "/api/login"), &policy));
        assert!(!Rule::AllowedPath.matches(&request(Method::GET, "/api/events"), &policy));

        assert!(Rule::ApiBearer.matches(&request(Method::GET, "/api/events"), &policy));
        assert!(!Rule::ApiBearer.matches(&request(Method::GET, "/user-dashboard"), &policy));

        assert!(Rule::AllowedPathUi.matches(&request(Method::GET, "/_next/app.js"), &policy));
        assert!(Rule::UiSession.matches(&request(Method::GET, "/user-dashboard"), &policy));
        assert!(!Rule::UiSession.matches(&request(Method::GET, "/api/events"), &policy));
    }

    #[tokio::test]
    async fn test_dot_segments_are_rejected_before_any_other_rule() {
        let verifier = StubVerifier::role(Role::Admin);
        let gate = gate(verifier.clone());

        for path in [
            "/health/../api/getGuestList",
            "/health/%2e%2e/api/getGuestList",
            "/_next/../admin/dashboard",
            "/api/login/./../deleteEvent",
        ] {
            assert_eq!(
                gate.evaluate(&request(Method::GET, path)).await,
                GateDecision::bad_request(),
                "path {}",
                path
            );
        }
        assert_eq!(
            gate.evaluate(&ui_request("/_next/../admin/dashboard", "abc")).await,
            GateDecision::bad_request()
        );
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_preflight_short_circuits_for_any_path() {
        let verifier = StubVerifier::role(Role::User);
        let gate = gate(verifier.clone());

        for path in ["/api/getGuestList", "/admin/dashboard", "/login", "/"] {
            let decision = gate.evaluate(&request(Method::OPTIONS, path)).await;
            assert_eq!(decision, GateDecision::Preflight, "path {}", path);
        }
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_allowed_paths_skip_verification() {
        let verifier = StubVerifier::failing("down");
        let gate = gate(verifier.clone());

        for path in ["/api/tokenverify", "/api/login/otp", "/health"] {
            assert_eq!(
                gate.evaluate(&request(Method::POST, path)).await,
                GateDecision::Continue
            );
        }
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_missing_or_malformed_bearer_is_401() {
        let verifier = StubVerifier::role(Role::Admin);
        let gate = gate(verifier.clone());

        let missing = gate.evaluate(&request(Method::GET, "/api/events")).await;
        assert_eq!(missing, GateDecision::unauthorized());

        for header in ["Basic abc", "bearer abc", "Bearer ", "abc"] {
            let decision = gate.evaluate(&api_request("/api/events", header)).await;
            assert_eq!(decision, GateDecision::unauthorized(), "header {}", header);
        }
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_api_reject_body_shape() {
        let gate = gate(StubVerifier::role(Role::User));
        let GateDecision::Reject { status, body } =
            gate.evaluate(&request(Method::DELETE, "/api/deleteEvent")).await
        else {
            panic!("expected reject");
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "status": "Unauthorized" }));
    }

    #[tokio::test]
    async fn test_api_decision_follows_verification_status() {
        let verifier = StubVerifier::new(Ok(VerificationResult::verified(None)));
        let decision = gate(verifier.clone())
            .evaluate(&api_request("/api/getGuestList", "Bearer abc"))
            .await;
        assert_eq!(decision, GateDecision::Continue);
        assert_eq!(
            verifier.last_authorization().as_deref(),
            Some("Bearer abc")
        );

        for status in [401, 403, 500] {
            let verifier = StubVerifier::new(Ok(VerificationResult::rejected(status)));
            let decision = gate(verifier)
                .evaluate(&api_request("/api/getGuestList", "Bearer abc"))
                .await;
            assert_eq!(decision, GateDecision::unauthorized(), "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_api_verification_failure_is_401() {
        for error in [
            GateError::VerificationUnreachable("connection refused".into()),
            GateError::MalformedVerification("eof".into()),
        ] {
            let gate = gate(StubVerifier::new(Err(error)));
            let decision = gate
                .evaluate(&api_request("/api/getGuestList", "Bearer abc"))
                .await;
            assert_eq!(decision, GateDecision::unauthorized());
        }
    }

    #[tokio::test]
    async fn test_api_paths_never_redirect_even_when_listed_for_ui() {
        let verifier = StubVerifier::role(Role::User);
        let policy = RoutePolicy {
            allowed_paths_ui: vec!["/api/public".to_string()],
            ..RoutePolicy::default()
        };
        let gate = Gate::new(policy, verifier);

        let decision = gate.evaluate(&request(Method::GET, "/api/public/feed")).await;
        assert_eq!(decision, GateDecision::unauthorized());
    }

    #[tokio::test]
    async fn test_allowed_ui_paths_skip_cookie_check() {
        let verifier = StubVerifier::role(Role::User);
        let gate = gate(verifier.clone());

        let decision = gate
            .evaluate(&request(Method::GET, "/_next/static/chunk.js"))
            .await;
        assert_eq!(decision, GateDecision::Continue);
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_ui_without_cookie_redirects_to_login() {
        let verifier = StubVerifier::role(Role::User);
        let gate = gate(verifier.clone());

        assert_eq!(
            gate.evaluate(&request(Method::GET, "/user-dashboard")).await,
            GateDecision::redirect("/login")
        );
        assert_eq!(
            gate.evaluate(&request(Method::GET, "/login")).await,
            GateDecision::Continue
        );
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_ui_cookie_is_sent_as_bearer() {
        let verifier = StubVerifier::role(Role::User);
        gate(verifier.clone())
            .evaluate(&ui_request("/user-dashboard", "abc"))
            .await;
        assert_eq!(
            verifier.last_authorization().as_deref(),
            Some("Bearer abc")
        );
    }

    #[tokio::test]
    async fn test_ui_role_redirects() {
        let user = gate(StubVerifier::role(Role::User));
        assert_eq!(
            user.evaluate(&ui_request("/admin/dashboard", "abc")).await,
            GateDecision::redirect("/user-dashboard")
        );
        assert_eq!(
            user.evaluate(&ui_request("/user-dashboard", "abc")).await,
            GateDecision::Continue
        );
        assert_eq!(
            user.evaluate(&ui_request("/login", "abc")).await,
            GateDecision::redirect("/user-dashboard")
        );

        let admin = gate(StubVerifier::role(Role::Admin));
        assert_eq!(
            admin.evaluate(&ui_request("/user-dashboard", "abc")).await,
            GateDecision::redirect("/admin/dashboard")
        );
        assert_eq!(
            admin.evaluate(&ui_request("/admin/dashboard", "abc")).await,
            GateDecision::Continue
        );
    }

    #[tokio::test]
    async fn test_ui_unrecognised_role_continues() {
        let gate = gate(StubVerifier::new(Ok(VerificationResult::verified(None))));
        assert_eq!(
            gate.evaluate(&ui_request("/admin/dashboard", "abc")).await,
            GateDecision::Continue
        );
    }

    #[tokio::test]
    async fn test_ui_invalid_token_redirects_unless_on_login() {
        let gate = gate(StubVerifier::new(Ok(VerificationResult::rejected(401))));
        assert_eq!(
            gate.evaluate(&ui_request("/user-dashboard", "stale")).await,
            GateDecision::redirect("/login")
        );
        assert_eq!(
            gate.evaluate(&ui_request("/login", "stale")).await,
            GateDecision::Continue
        );
    }

    #[tokio::test]
    async fn test_ui_verification_failure_uses_same_login_guard() {
        let gate = gate(StubVerifier::failing("timed out"));
        assert_eq!(
            gate.evaluate(&ui_request("/admin/dashboard", "abc")).await,
            GateDecision::redirect("/login")
        );
        assert_eq!(
            gate.evaluate(&ui_request("/login", "abc")).await,
            GateDecision::Continue
        );
    }

    #[tokio::test]
    async fn test_repeated_evaluation_is_stable() {
        let verifier = StubVerifier::role(Role::User);
        let gate = gate(verifier.clone());
        let request = ui_request("/admin/dashboard", "abc");

        let first = gate.evaluate(&request).await;
        for _ in 0..3 {
            assert_eq!(gate.evaluate(&request).await, first);
        }
        assert_eq!(verifier.calls(), 4);
    }
}
