mod basic;
mod interface;
mod status;
mod strict;
#[cfg(test)]
mod tests;

pub use basic::*;
pub use interface::*;
pub use status::*;
pub use strict::*;
