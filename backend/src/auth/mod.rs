//! Authentication and request gating.
//!
//! This module provides the request gate that runs in front of every route:
//! CORS handling, bearer checks for API paths, cookie checks and role-based
//! redirects for UI paths, plus the client for the token verification endpoint.

pub mod cors;
pub mod gate;
pub mod middleware;
pub mod models;
pub mod request;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;
