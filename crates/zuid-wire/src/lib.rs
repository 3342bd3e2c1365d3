#![doc = include_str!("../README.md")]

pub mod client;
mod common;
pub use common::*;
// Public re-export so downstream crates can access `zuid` via
// `zuid_wire::zuid`
pub use zuid;
