//! # Messages, routing tokens and protocol limits
//!
//! - [`Multipart`] - An ordered list of opaque byte frames; the unit every
//!   connection sends and receives.
//! - [`RoutingToken`] - The frame the server prepends to an inbound message so
//!   the reply can find its way back to the originating connection.
//!
//! ## Constants
//!
//! - [`MAX_MESSAGE_BYTES`] / [`MAX_PARTS`] - Limits the server applies to
//!   inbound messages.
//! - [`CLIENT_MAX_MESSAGE_BYTES`] - Limit a client applies to replies, which
//!   grow with the requested count.

use bytes::Bytes;
use std::collections::{VecDeque, vec_deque};

/// Largest inbound message the server decodes (16 MiB).
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Largest number of parts the server decodes in one inbound message.
pub const MAX_PARTS: usize = 1024 * 1024;

/// Largest reply a client decodes (1 GiB). A reply to a count of `K` needs
/// about `K * 24` bytes.
pub const CLIENT_MAX_MESSAGE_BYTES: usize = 1024 * 1024 * 1024;

/// An ordered sequence of opaque frames.
///
/// The transport never looks inside the frames. Only the worker interprets
/// the count frame, and only the proxy interprets the routing token frame it
/// added itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Multipart {
    parts: VecDeque<Bytes>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            parts: VecDeque::with_capacity(capacity),
        }
    }

    /// Number of frames in the message.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn push_back(&mut self, part: impl Into<Bytes>) {
        self.parts.push_back(part.into());
    }

    pub fn push_front(&mut self, part: impl Into<Bytes>) {
        self.parts.push_front(part.into());
    }

    pub fn pop_front(&mut self) -> Option<Bytes> {
        self.parts.pop_front()
    }

    pub fn front(&self) -> Option<&Bytes> {
        self.parts.front()
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Bytes> {
        self.parts.iter()
    }
}

impl IntoIterator for Multipart {
    type Item = Bytes;
    type IntoIter = vec_deque::IntoIter<Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

impl<'a> IntoIterator for &'a Multipart {
    type Item = &'a Bytes;
    type IntoIter = vec_deque::Iter<'a, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

impl<P: Into<Bytes>> FromIterator<P> for Multipart {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            parts: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<VecDeque<Bytes>> for Multipart {
    fn from(parts: VecDeque<Bytes>) -> Self {
        Self { parts }
    }
}

/// Opaque identity of one client connection.
///
/// Tokens are minted by the server from a process-wide counter and never
/// reused while the process runs. Clients never see them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RoutingToken(Bytes);

impl RoutingToken {
    /// Size in bytes of a token minted by [`RoutingToken::from_sequence`].
    pub const LEN: usize = core::mem::size_of::<u64>();

    /// Mints a token from a unique connection sequence number.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(Bytes::copy_from_slice(&sequence.to_be_bytes()))
    }

    /// Wraps a frame taken off a message without inspecting it.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<RoutingToken> for Bytes {
    fn from(token: RoutingToken) -> Self {
        token.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_prepended_and_popped_in_order() {
        let mut message: Multipart = ["7"].into_iter().collect();
        let token = RoutingToken::from_sequence(42);
        message.push_front(token.clone());

        assert_eq!(message.len(), 2);
        let popped = message.pop_front().map(RoutingToken::from_bytes);
        assert_eq!(popped, Some(token));
        assert_eq!(message.pop_front().as_deref(), Some(&b"7"[..]));
        assert!(message.is_empty());
    }

    #[test]
    fn tokens_differ_per_sequence() {
        let a = RoutingToken::from_sequence(1);
        let b = RoutingToken::from_sequence(2);
        assert_ne!(a, b);
        assert_eq!(a.as_bytes().len(), RoutingToken::LEN);
    }
}
