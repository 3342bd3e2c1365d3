//! Per-connection framing task.
//!
//! A connection task owns one client socket. It tags every inbound message
//! with the connection's [`RoutingToken`] before passing it to the broker,
//! and writes back whatever replies the broker routes to it. It never looks
//! at payloads.

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_util::{codec::Framed, sync::CancellationToken};
use zuid_wire::{Multipart, MultipartCodec, RoutingToken};

/// What a connection task tells the broker.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A client message with the routing token already prepended.
    Inbound(Multipart),
    /// The connection is gone; replies for it can be discarded.
    Closed(RoutingToken),
}

/// Relays between one client socket and the broker until either side goes
/// away or `shutdown` fires.
///
/// A malformed frame ends the connection; anything else about the message is
/// left for the worker to judge.
pub async fn serve_connection(
    token: RoutingToken,
    stream: TcpStream,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    mut replies: mpsc::UnboundedReceiver<Multipart>,
    shutdown: CancellationToken,
) {
    let mut framed = Framed::new(stream, MultipartCodec::new());

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            inbound = framed.next() => match inbound {
                Some(Ok(mut message)) => {
                    message.push_front(token.clone());
                    if events.send(ConnectionEvent::Inbound(message)).is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::debug!("Closing connection {:?}: {e}", token.as_bytes());
                    break;
                }
                None => break,
            },
            Some(reply) = replies.recv() => {
                if let Err(e) = framed.send(reply).await {
                    tracing::debug!("Failed to write reply to {:?}: {e}", token.as_bytes());
                    break;
                }
            }
        }
    }

    let _ = events.send(ConnectionEvent::Closed(token));
}
