//! The fixed pool of generator workers.
//!
//! - [`worker`] - The per-worker loop and request handling.
//! - [`request`] - Request validation and count parsing.
//! - [`manager`] - Idle tracking and dispatch on behalf of the proxy.
//! - [`generator`] - The generator flavor a worker runs.

pub mod generator;
pub mod manager;
pub mod request;
pub mod worker;
