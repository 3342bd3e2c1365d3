//! The dispatch proxy.
//!
//! - [`broker`] - The single task owning all routing state.
//! - [`connection`] - One task per client connection doing framing I/O.

pub mod broker;
pub mod connection;
