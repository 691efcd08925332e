//! Outbound clients for the event application.

pub mod event_client;
pub mod upstream;
