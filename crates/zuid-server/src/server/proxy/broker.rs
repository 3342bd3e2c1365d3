//! The proxy task: accepts connections and relays messages between them and
//! the worker pool.
//!
//! All routing state lives in this one task. Connection tasks and workers
//! talk to it over channels, so nothing here is locked.
//!
//! ```text
//!  client A ──► conn task ──[token A, "3"]──┐
//!  client B ──► conn task ──[token B, "9"]──┼──► Broker ──► idle worker
//!                                           │
//!  client A ◄── conn task ◄──[id, id, id]───┴──◄ [token A, id, id, id]
//! ```

use crate::server::{
    pool::{manager::WorkerPool, worker::WorkerEvent},
    proxy::connection::{ConnectionEvent, serve_connection},
    telemetry::increment_connections,
};
use std::{collections::HashMap, net::SocketAddr};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use zuid_wire::{Multipart, RoutingToken};

pub struct Broker {
    pool: WorkerPool,
    routes: HashMap<RoutingToken, mpsc::UnboundedSender<Multipart>>,
    next_token: u64,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    shutdown: CancellationToken,
}

impl Broker {
    pub fn new(pool: WorkerPool, shutdown: CancellationToken) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            pool,
            routes: HashMap::new(),
            next_token: 0,
            events_tx,
            events_rx,
            shutdown,
        }
    }

    /// Runs until `shutdown` fires, then hands the pool back so the caller
    /// can stop the workers.
    pub async fn run(mut self, listener: TcpListener) -> WorkerPool {
        loop {
            tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                Some(event) = self.pool.next_event() => self.on_worker_event(event),
                Some(event) = self.events_rx.recv() => self.on_connection_event(event),
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.register(stream, peer),
                    Err(e) => tracing::warn!("Failed to accept connection: {e}"),
                },
            }
        }

        tracing::debug!("Proxy stopped with {} open connections", self.routes.len());
        self.pool
    }

    fn register(&mut self, stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY for {peer}: {e}");
        }

        let token = RoutingToken::from_sequence(self.next_token);
        self.next_token += 1;
        tracing::debug!("Accepted connection from {peer} as {:?}", token.as_bytes());
        increment_connections();

        let (replies_tx, replies_rx) = mpsc::unbounded_channel();
        self.routes.insert(token.clone(), replies_tx);
        tokio::spawn(serve_connection(
            token,
            stream,
            self.events_tx.clone(),
            replies_rx,
            self.shutdown.child_token(),
        ));
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Inbound(message) => self.pool.dispatch(message),
            ConnectionEvent::Closed(token) => {
                self.routes.remove(&token);
            }
        }
    }

    fn on_worker_event(&mut self, event: WorkerEvent) {
        if let Some(reply) = event.reply {
            self.route_reply(reply);
        }
        self.pool.worker_ready(event.worker);
    }

    /// Strips the routing token and forwards the rest to its connection.
    ///
    /// Replies for connections that have since closed are discarded.
    fn route_reply(&mut self, mut reply: Multipart) {
        let Some(token) = reply.pop_front().map(RoutingToken::from_bytes) else {
            return;
        };
        match self.routes.get(&token) {
            Some(tx) => {
                if tx.send(reply).is_err() {
                    self.routes.remove(&token);
                }
            }
            None => tracing::debug!("Discarding reply for closed connection {:?}", token.as_bytes()),
        }
    }
}
