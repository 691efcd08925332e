//! HTTP client for the event application's REST endpoints.
//!
//! Every call takes the caller's credential explicitly; the client never
//! holds a token of its own.
//!
//! The gate binary does not call these endpoints itself; `EventClient` is
//! library surface for front ends that embed `event_gate` and act on behalf
//! of a signed-in user.

use crate::api::common::validation_errors_to_field_errors;
use crate::api::event::models::{EventIdParam, Guest, GuestListResponse, MessageResponse};
use crate::auth::models::BearerToken;
use crate::errors::{ServiceError, ServiceResult};
use reqwest::{Client, Response, StatusCode, header::AUTHORIZATION};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use validator::Validate;

/// Client for `/api/getGuestList` and `/api/deleteEvent`.
#[derive(Clone)]
pub struct EventClient {
    client: Client,
    base_url: String,
}

impl EventClient {
    /// Creates a client for the event application at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::internal_error(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetches the guest list of an event.
    #[instrument(skip(self, token))]
    pub async fn get_guest_list(
        &self,
        token: &BearerToken,
        event_id: &str,
    ) -> ServiceResult<Vec<Guest>> {
        validate_event_id(event_id)?;

        let response = self
            .client
            .get(format!("{}/api/getGuestList", self.base_url))
            .query(&[("event_id", event_id)])
            .header(AUTHORIZATION, token.authorization_value())
            .send()
            .await
            .map_err(request_failed)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, event_id).await);
        }

        let body = response.json::<GuestListResponse>().await.map_err(|e| {
            ServiceError::external_service(format!("Invalid guest list response: {}", e))
        })?;

        debug!(guests = body.data.len(), "Fetched guest list");
        Ok(body.data)
    }

    /// Deletes an event and returns the server's confirmation message.
    #[instrument(skip(self, token))]
    pub async fn delete_event(&self, token: &BearerToken, event_id: &str) -> ServiceResult<String> {
        validate_event_id(event_id)?;

        let response = self
            .client
            .delete(format!("{}/api/deleteEvent", self.base_url))
            .query(&[("eventId", event_id)])
            .header(AUTHORIZATION, token.authorization_value())
            .send()
            .await
            .map_err(request_failed)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, event_id).await);
        }

        // The delete already happened; an unreadable confirmation only loses
        // the server's wording.
        let bytes = response.bytes().await.map_err(request_failed)?;
        let message = if bytes.is_empty() {
            None
        } else {
            match serde_json::from_slice::<MessageResponse>(&bytes) {
                Ok(body) => body.message,
                Err(e) => {
                    warn!(error = %e, event_id, "Undecodable delete confirmation");
                    None
                }
            }
        };

        Ok(message.unwrap_or_else(|| "Event deleted".to_string()))
    }
}

fn validate_event_id(event_id: &str) -> ServiceResult<()> {
    let param = EventIdParam {
        event_id: event_id.trim().to_string(),
    };
    param.validate().map_err(|errors| {
        let message = validation_errors_to_field_errors(&errors)
            .into_iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect::<Vec<_>>()
            .join(", ");
        ServiceError::validation(message)
    })
}

fn request_failed(error: reqwest::Error) -> ServiceError {
    warn!(error = %error, "Event service request failed");
    ServiceError::external_service("Event service is unavailable")
}

async fn error_from_response(response: Response, event_id: &str) -> ServiceError {
    let status = response.status();
    let message = response
        .json::<MessageResponse>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| format!("Event service returned {}", status));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::unauthorized(message),
        StatusCode::NOT_FOUND => ServiceError::not_found("Event", event_id),
        _ => ServiceError::external_service(message),
    }
}
