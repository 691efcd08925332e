//! HTTP-facing pieces of the service: the response envelope, the event API
//! models and the upstream proxy handler.

pub mod common;
pub mod event;
pub mod proxy;
