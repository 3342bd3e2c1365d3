//! Length-prefixed multi-part message codec.
//!
//! ```text
//! +-------------+-----------+---------+-----------+---------+-----
//! | parts (u32) | len (u32) | part 0  | len (u32) | part 1  | ...
//! +-------------+-----------+---------+-----------+---------+-----
//! ```
//!
//! All integers are big-endian. A message with zero parts is valid.

use crate::{FrameError, MAX_MESSAGE_BYTES, MAX_PARTS, Multipart};
use bytes::{Buf, BufMut, BytesMut};
use std::collections::VecDeque;
use tokio_util::codec::{Decoder, Encoder};

const HEADER_LEN: usize = core::mem::size_of::<u32>();

/// [`Decoder`]/[`Encoder`] for [`Multipart`] messages.
///
/// Limits apply to decoding only. A peer announcing more than `max_parts`
/// parts or more than `max_message_bytes` bytes in total is rejected before
/// the message is buffered in full.
///
/// The decoder remembers how far it has walked the length prefixes of a
/// partially received message, so each byte is examined once no matter how
/// the stream is chunked.
#[derive(Clone, Debug)]
pub struct MultipartCodec {
    max_parts: usize,
    max_message_bytes: usize,
    /// Length prefixes of the pending message already walked.
    scanned_parts: usize,
    /// End offset of the last walked part; 0 when no message is pending.
    end: usize,
}

impl Default for MultipartCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartCodec {
    /// A codec with the server's inbound limits ([`MAX_PARTS`],
    /// [`MAX_MESSAGE_BYTES`]).
    pub const fn new() -> Self {
        Self::with_limits(MAX_PARTS, MAX_MESSAGE_BYTES)
    }

    pub const fn with_limits(max_parts: usize, max_message_bytes: usize) -> Self {
        Self {
            max_parts,
            max_message_bytes,
            scanned_parts: 0,
            end: 0,
        }
    }

    pub const fn max_parts(&self) -> usize {
        self.max_parts
    }

    pub const fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }
}

impl MultipartCodec {
    fn reset(&mut self) {
        self.scanned_parts = 0;
        self.end = 0;
    }
}

fn read_u32(src: &[u8], at: usize) -> Option<u32> {
    let bytes: [u8; HEADER_LEN] = src.get(at..at + HEADER_LEN)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

impl Decoder for MultipartCodec {
    type Item = Multipart;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Multipart>, FrameError> {
        let Some(parts) = read_u32(src, 0) else {
            return Ok(None);
        };
        let parts = parts as usize;
        if parts > self.max_parts {
            self.reset();
            return Err(FrameError::TooManyParts {
                parts,
                max: self.max_parts,
            });
        }

        // Walk the length prefixes until the whole message is known to be
        // buffered, resuming where the previous call stopped. Nothing is
        // consumed until then.
        if self.end == 0 {
            self.end = HEADER_LEN;
        }
        while self.scanned_parts < parts {
            let Some(len) = read_u32(src, self.end) else {
                src.reserve(self.end + HEADER_LEN - src.len());
                return Ok(None);
            };
            let end = self.end + HEADER_LEN + len as usize;
            if end > self.max_message_bytes {
                self.reset();
                return Err(FrameError::MessageTooLarge {
                    size: end,
                    max: self.max_message_bytes,
                });
            }
            self.end = end;
            self.scanned_parts += 1;
        }
        if src.len() < self.end {
            src.reserve(self.end - src.len());
            return Ok(None);
        }

        let end = self.end;
        self.reset();
        let mut message = src.split_to(end).freeze();
        message.advance(HEADER_LEN);
        let mut out = VecDeque::with_capacity(parts);
        for _ in 0..parts {
            let len = message.get_u32() as usize;
            out.push_back(message.split_to(len));
        }
        Ok(Some(Multipart::from(out)))
    }
}

impl Encoder<Multipart> for MultipartCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Multipart, dst: &mut BytesMut) -> Result<(), FrameError> {
        let parts = u32::try_from(item.len()).map_err(|_| FrameError::TooManyParts {
            parts: item.len(),
            max: u32::MAX as usize,
        })?;
        let size = HEADER_LEN + item.iter().map(|part| HEADER_LEN + part.len()).sum::<usize>();

        dst.reserve(size);
        dst.put_u32(parts);
        for part in item {
            let len = u32::try_from(part.len()).map_err(|_| FrameError::MessageTooLarge {
                size: part.len(),
                max: u32::MAX as usize,
            })?;
            dst.put_u32(len);
            dst.extend_from_slice(&part);
        }
        Ok(())
    }
}
