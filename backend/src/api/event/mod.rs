//! Event and guest-list models used by the event API client.

pub mod models;
