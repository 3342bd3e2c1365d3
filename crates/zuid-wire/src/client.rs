//! Async client for the zuid id service.
//!
//! One [`ZuidClient`] wraps one TCP connection. Requests on a connection are
//! answered in the order the server finishes them, so a client expecting a
//! strict request/reply pairing should keep one request in flight at a time.

use crate::{CLIENT_MAX_MESSAGE_BYTES, Error, Multipart, MultipartCodec, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use zuid::ZuidId;

/// A connection to a zuid server.
pub struct ZuidClient {
    framed: Framed<TcpStream, MultipartCodec>,
}

impl ZuidClient {
    /// Connects to the server at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the connection cannot be established.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream))
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        // Replies grow with the requested count; accept up to one part per
        // four bytes of the size limit.
        let codec = MultipartCodec::with_limits(
            CLIENT_MAX_MESSAGE_BYTES / 4,
            CLIENT_MAX_MESSAGE_BYTES,
        );
        Self {
            framed: Framed::new(stream, codec),
        }
    }

    /// Requests `count` identifiers and waits for the reply.
    ///
    /// A `count` of zero returns an empty list without contacting the server,
    /// because the server never answers such a request.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the server hangs up first.
    /// - [`Error::UnexpectedReply`] if the reply holds a different number of
    ///   identifiers.
    /// - [`Error::InvalidIdentifier`] if a part is not a decimal `i64`.
    pub async fn request(&mut self, count: u32) -> Result<Vec<ZuidId>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut message = Multipart::with_capacity(1);
        message.push_back(count.to_string());
        self.send_raw(message).await?;

        let reply = self.recv_raw().await?;
        if reply.len() != count as usize {
            return Err(Error::UnexpectedReply {
                expected: count as usize,
                received: reply.len(),
            });
        }

        reply
            .iter()
            .map(|part| {
                let text = String::from_utf8_lossy(part);
                text.parse::<ZuidId>().map_err(Error::from)
            })
            .collect()
    }

    /// Sends an arbitrary message, bypassing request validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frame`] if the message cannot be written.
    pub async fn send_raw(&mut self, message: Multipart) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::trace!("Sending {} part message", message.len());
        self.framed.send(message).await?;
        Ok(())
    }

    /// Waits for the next message from the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the stream ends, or
    /// [`Error::Frame`] if the server sent a malformed message.
    pub async fn recv_raw(&mut self) -> Result<Multipart> {
        match self.framed.next().await {
            Some(message) => Ok(message?),
            None => Err(Error::ConnectionClosed),
        }
    }
}
