//! Least-recently-used dispatch over a fixed set of workers.
//!
//! The [`WorkerPool`] spawns one task per worker and keeps two queues, both
//! owned by the proxy task and touched by nothing else:
//!
//! - idle workers, in the order they became free;
//! - requests waiting for a worker, in arrival order, without bound.
//!
//! A request is handed to the worker that has been idle the longest. Each
//! worker's channel holds at most one request, and a worker only receives a
//! request while idle, so sending never waits.

use crate::server::{
    config::ServerConfig,
    pool::{
        generator::Generator,
        worker::{WorkRequest, WorkerEvent, worker_loop},
    },
};
use core::time::Duration;
use std::collections::VecDeque;
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use zuid::{WorkerId, ZuidGenerator};
use zuid_wire::Multipart;

/// How long shutdown waits for each worker to acknowledge.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    events: mpsc::UnboundedReceiver<WorkerEvent>,
    idle: VecDeque<usize>,
    backlog: VecDeque<Multipart>,
    shutdown_token: CancellationToken,
}

impl WorkerPool {
    /// Spawns `config.num_workers` workers, worker `i` using worker id `i`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(config: &ServerConfig, shutdown_token: CancellationToken) -> Self {
        Self::spawn_with(
            config.num_workers,
            config.max_ids_per_request,
            shutdown_token,
            |worker| Generator::new(config.machine_id, worker, config.strict_sequence),
        )
    }

    /// Spawns `num_workers` workers with generators built by `make`.
    ///
    /// Worker indices beyond the worker id space are skipped.
    pub fn spawn_with<G, F>(
        num_workers: usize,
        max_ids_per_request: u64,
        shutdown_token: CancellationToken,
        mut make: F,
    ) -> Self
    where
        G: ZuidGenerator + Send + 'static,
        F: FnMut(WorkerId) -> G,
    {
        let (events_tx, events) = mpsc::unbounded_channel();
        let mut workers = Vec::with_capacity(num_workers);

        for index in 0..num_workers {
            let Ok(worker_id) = WorkerId::try_from(index) else {
                tracing::warn!("Skipping worker {index}: outside the worker id space");
                continue;
            };
            // A worker is only sent a request while idle, so one slot suffices.
            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(worker_loop(
                workers.len(),
                rx,
                events_tx.clone(),
                make(worker_id),
                max_ids_per_request,
                shutdown_token.clone(),
            ));
            workers.push(tx);
        }

        Self {
            workers,
            events,
            idle: VecDeque::with_capacity(num_workers),
            backlog: VecDeque::new(),
            shutdown_token,
        }
    }

    /// Number of workers started.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Requests waiting for a free worker.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Workers currently idle.
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Waits for the next readiness or reply event from any worker.
    ///
    /// Returns `None` once every worker has exited.
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    /// Hands `message` to the longest idle worker, or queues it if all are
    /// busy.
    pub fn dispatch(&mut self, message: Multipart) {
        let mut message = message;
        while let Some(worker) = self.idle.pop_front() {
            match self.try_send(worker, message) {
                Ok(()) => return,
                Err(returned) => message = returned,
            }
        }
        self.backlog.push_back(message);
    }

    /// Marks `worker` free: gives it the oldest queued request, or records it
    /// as idle.
    pub fn worker_ready(&mut self, worker: usize) {
        let Some(message) = self.backlog.pop_front() else {
            self.idle.push_back(worker);
            return;
        };
        if let Err(message) = self.try_send(worker, message) {
            // The worker is gone; keep the request for the next one.
            self.backlog.push_front(message);
        }
    }

    fn try_send(&self, worker: usize, message: Multipart) -> Result<(), Multipart> {
        let Some(tx) = self.workers.get(worker) else {
            return Err(message);
        };
        tx.try_send(WorkRequest::Generate { message })
            .map_err(|err| {
                tracing::error!("Worker {worker} could not take a request: {err}");
                match err.into_inner() {
                    WorkRequest::Generate { message } => message,
                    WorkRequest::Shutdown { .. } => unreachable!("only requests are sent here"),
                }
            })
    }

    /// Stops every worker.
    ///
    /// - Cancels the shared [`CancellationToken`], abandoning long batches.
    /// - Sends a [`WorkRequest::Shutdown`] to each worker.
    /// - Waits up to 3 seconds per worker for acknowledgements.
    ///
    /// Requests still queued are discarded.
    pub async fn shutdown(self) {
        tracing::debug!(
            "Cancelling remaining work ({} queued requests discarded)",
            self.backlog.len()
        );
        self.shutdown_token.cancel();

        let mut acks = Vec::with_capacity(self.workers.len());
        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                tracing::debug!("Worker {i} already stopped: {e}");
            } else {
                acks.push((i, rx));
            }
        }

        let waits = acks.into_iter().map(|(i, rx)| async move {
            match timeout(SHUTDOWN_TIMEOUT, rx).await {
                Ok(Ok(())) => tracing::trace!("Worker {i} shutdown acknowledged"),
                Ok(Err(e)) => tracing::debug!("Worker {i} exited without acknowledging: {e}"),
                Err(_) => tracing::warn!("Worker {i} shutdown timed out"),
            }
        });
        futures::future::join_all(waits).await;

        tracing::info!("Worker pool shutdown complete");
    }
}
