//! Error types for framing and client operations.
//!
//! ## Error Cases
//! - [`FrameError`]: the byte stream does not hold a well-formed multi-part
//!   message within the codec's limits, or the socket failed.
//! - [`Error`]: everything a [`ZuidClient`] call can fail with.
//!
//! The server never reports errors to clients on the wire. A request it
//! cannot serve simply receives no reply.
//!
//! [`ZuidClient`]: crate::client::ZuidClient

use std::io;

pub type Result<T> = core::result::Result<T, Error>;

/// Failure to encode or decode a multi-part message.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    /// Underlying socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The message announces more parts than the codec accepts.
    #[error("Message has {parts} parts (max = {max})")]
    TooManyParts { parts: usize, max: usize },

    /// The message (or a single part) exceeds the codec's size limit.
    #[error("Message of {size} bytes exceeds the limit of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },
}

/// Unified error type for client operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Connecting or talking to the server failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server sent bytes that are not a valid message.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// The server closed the connection before replying.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// A reply part is not the decimal form of an identifier.
    #[error("Invalid identifier in reply: {0}")]
    InvalidIdentifier(#[from] zuid::Error),

    /// The reply holds a different number of identifiers than requested.
    #[error("Expected {expected} identifiers, received {received}")]
    UnexpectedReply { expected: usize, received: usize },
}
