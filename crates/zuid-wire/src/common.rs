//! Wire-level definitions shared by the server and its clients.
//!
//! - [`frame`]: the multi-part message codec used on every TCP connection.
//! - [`types`]: messages, routing tokens and protocol limits.
//! - [`Error`]/[`FrameError`]: the error types for both.

mod error;
pub mod frame;
pub mod types;

pub use error::*;
pub use frame::*;
pub use types::*;
