//! Global application error types.
//!
//! `GateError` covers everything that can go wrong while deciding whether a
//! request may pass the gate. `ServiceError` is the service-layer error used by
//! the event API client and the upstream proxy, and is converted to HTTP by
//! `api::common::service_error_to_http`.

use thiserror::Error;

/// Reasons a request could not be authenticated by the gate.
///
/// None of these ever reach the transport layer: the gate folds each one into
/// a reject or redirect decision.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// No bearer header (API) or no `token` cookie (UI), or a malformed header.
    #[error("Missing credential")]
    MissingCredential,
    /// The verification endpoint answered with a non-200 status.
    #[error("Invalid credential (verification status {status})")]
    InvalidCredential { status: u16 },
    /// The verification endpoint could not be reached or timed out.
    #[error("Verification endpoint unreachable: {0}")]
    VerificationUnreachable(String),
    /// The verification endpoint answered 200 with a body we could not decode.
    #[error("Malformed verification response: {0}")]
    MalformedVerification(String),
}

/// Generic service error that can be used across all entities
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("External service error: {message}")]
    ExternalService { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::PayloadTooLarge { limit }
    }

    pub fn external_service(message: impl Into<String>) -> Self {
        Self::ExternalService {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}
