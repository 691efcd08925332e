//! Data structures for authentication-related entities.
//!
//! This module defines the bearer credential, the user roles the gate routes
//! on, and the decoded outcome of a token verification call.

use serde::Deserialize;
use std::fmt;

const BEARER_PREFIX: &str = "Bearer ";

/// Opaque bearer credential presented by the client.
///
/// The gate only reads and forwards it; `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Parses an `Authorization` header value of the exact form `Bearer <token>`.
    pub fn from_authorization(header: &str) -> Option<Self> {
        let token = header.strip_prefix(BEARER_PREFIX)?;
        if token.trim().is_empty() {
            return None;
        }
        Some(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `Authorization` header value carrying this token.
    pub fn authorization_value(&self) -> String {
        format!("{}{}", BEARER_PREFIX, self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// User role reported by the verification endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Maps the verification body's `type` field. Unknown values yield `None`.
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "Admin" => Some(Role::Admin),
            "User" => Some(Role::User),
            _ => None,
        }
    }
}

/// JSON body returned by `/api/tokenverify` on success.
#[derive(Debug, Deserialize)]
pub struct TokenVerifyBody {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Outcome of asking the verification endpoint about a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub valid: bool,
    pub status: u16,
    /// Present only when `valid` and the reported type is recognised.
    pub role: Option<Role>,
}

impl VerificationResult {
    pub fn verified(role: Option<Role>) -> Self {
        Self {
            valid: true,
            status: 200,
            role,
        }
    }

    pub fn rejected(status: u16) -> Self {
        Self {
            valid: false,
            status,
            role: None,
        }
    }
}
