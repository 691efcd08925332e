//! Request gate for the event management application.
//!
//! Every inbound request passes through the gate, which applies CORS headers,
//! checks bearer tokens on API paths, checks the session cookie on UI paths,
//! and redirects users to the dashboard that matches their role. Requests that
//! pass are forwarded to the upstream event application.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod routes;
pub mod services;
