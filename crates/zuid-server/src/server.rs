//! Server-side components of the id service.
//!
//! - [`config`] - CLI/env configuration and validation.
//! - [`pool`] - Worker tasks and the pool that tracks which are idle.
//! - [`proxy`] - The broker relaying between client connections and workers.
//! - [`service`] - Wires the pool and proxy together for one listener.
//! - [`telemetry`] - Logging and optional metrics.

pub mod config;
pub mod pool;
pub mod proxy;
pub mod service;
pub mod telemetry;
