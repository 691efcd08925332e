//! Test doubles shared by the auth tests.

use crate::auth::models::{Role, VerificationResult};
use crate::auth::verifier::TokenVerifier;
use crate::errors::GateError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Verifier with a canned answer that records what it was asked.
pub(crate) struct StubVerifier {
    outcome: Result<VerificationResult, GateError>,
    calls: AtomicUsize,
    last_authorization: Mutex<Option<String>>,
}

impl StubVerifier {
    pub(crate) fn new(outcome: Result<VerificationResult, GateError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_authorization: Mutex::new(None),
        })
    }

    pub(crate) fn role(role: Role) -> Arc<Self> {
        Self::new(Ok(VerificationResult::verified(Some(role))))
    }

    pub(crate) fn failing(reason: &str) -> Arc<Self> {
        Self::new(Err(GateError::VerificationUnreachable(reason.to_string())))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_authorization(&self) -> Option<String> {
        self.last_authorization.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenVerifier for StubVerifier {
    async fn verify(&self, authorization: &str) -> Result<VerificationResult, GateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_authorization.lock().unwrap() = Some(authorization.to_string());
        self.outcome.clone()
    }
}
