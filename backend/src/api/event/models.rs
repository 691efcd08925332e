//! Wire models for the event REST endpoints and the derived data an event
//! card displays.
//!
//! `EventCard` and `filter_guests` are library surface for front ends built
//! on `event_gate`; the gate binary itself only relays these payloads.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

/// Event as returned by the event application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    pub date: String,
    pub link: String,
    #[serde(default)]
    pub total_send: u64,
    // Field name as spelled by the event application.
    #[serde(default)]
    pub total_recieved: u64,
}

/// One row of an event's guest list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub mobile: String,
    #[serde(default)]
    pub send: u64,
    #[serde(default)]
    pub receive: u64,
}

/// `GET /api/getGuestList` response body.
#[derive(Debug, Deserialize)]
pub struct GuestListResponse {
    #[serde(default)]
    pub data: Vec<Guest>,
}

/// Body returned by the event endpoints, on success and on failure.
#[derive(Debug, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Identifies the event a request targets.
#[derive(Debug, Validate)]
pub struct EventIdParam {
    #[validate(length(min = 1, message = "Event id is required"))]
    pub event_id: String,
}

/// Display data for an event card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventCard {
    pub title: String,
    pub link: String,
    pub formatted_date: String,
    /// Present only when at least one invitation was sent.
    pub total_sent: Option<u64>,
    /// Present only when at least one response was received.
    pub total_received: Option<u64>,
}

impl From<&Event> for EventCard {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            link: event.link.clone(),
            formatted_date: format_event_date(&event.date),
            total_sent: Some(event.total_send).filter(|total| *total > 0),
            total_received: Some(event.total_recieved).filter(|total| *total > 0),
        }
    }
}

/// Renders an RFC 3339 timestamp or `YYYY-MM-DD` date as `16 October 2026`.
/// Unparseable input is returned unchanged.
pub fn format_event_date(raw: &str) -> String {
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%d %B %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Guests whose name contains `search` (case-insensitive) or whose mobile
/// number contains it. An empty search keeps everyone.
pub fn filter_guests<'a>(guests: &'a [Guest], search: &str) -> Vec<&'a Guest> {
    let needle = search.to_lowercase();
    guests
        .iter()
        .filter(|guest| {
            guest.name.to_lowercase().contains(&needle) || guest.mobile.contains(search)
        })
        .collect()
}

/// Accepts ids sent either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
