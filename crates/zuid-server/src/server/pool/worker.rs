use crate::server::{
    pool::request::IdRequest,
    telemetry::{
        increment_dropped_requests, increment_ids_generated, increment_requests,
        record_ids_per_request,
    },
};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use zuid::{IdGenStatus, ZuidGenerator};
use zuid_wire::Multipart;

/// Ids generated between checks for shutdown in a long batch.
const SHUTDOWN_CHECK_INTERVAL: u64 = 4096;

/// Reply parts reserved up front; larger replies grow as they fill.
const MAX_PREALLOCATED_PARTS: u64 = 4096;

/// Work delivered to a single worker.
#[derive(Debug)]
pub enum WorkRequest {
    /// A `[token, count]` message relayed by the proxy.
    Generate { message: Multipart },
    /// Stop after acknowledging on `response`.
    Shutdown { response: oneshot::Sender<()> },
}

/// Sent by a worker when it becomes free.
///
/// The first event a worker sends carries no reply and announces it is
/// ready. After that, exactly one event follows each
/// [`WorkRequest::Generate`], with the reply unless the request was dropped.
#[derive(Debug)]
pub struct WorkerEvent {
    pub worker: usize,
    pub reply: Option<Multipart>,
}

/// Worker task answering id requests with its own generator.
///
/// Each worker owns its generator outright; its sequence counter is never
/// shared. The loop runs until it receives [`WorkRequest::Shutdown`], its
/// channel closes, or the proxy stops listening for its events.
///
/// # Arguments
///
/// - `worker`: Index of this worker in the pool (its worker id).
/// - `rx`: Receiver through which [`WorkRequest`]s arrive.
/// - `events`: Where readiness and replies go.
/// - `generator`: The generator owned by this worker.
/// - `max_ids_per_request`: Requests above this count are dropped.
/// - `shutdown`: Aborts a long batch in progress.
pub async fn worker_loop<G: ZuidGenerator + Send>(
    worker: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    mut generator: G,
    max_ids_per_request: u64,
    shutdown: CancellationToken,
) {
    tracing::trace!("Worker {worker} started");

    if events.send(WorkerEvent { worker, reply: None }).is_err() {
        tracing::debug!("Worker {worker} found no proxy listening");
        return;
    }

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Generate { message } => {
                let reply = handle_request(
                    worker,
                    message,
                    &mut generator,
                    max_ids_per_request,
                    &shutdown,
                )
                .await;
                if events.send(WorkerEvent { worker, reply }).is_err() {
                    tracing::debug!("Worker {worker} lost the proxy");
                    break;
                }
            }
            WorkRequest::Shutdown { response } => {
                tracing::debug!("Worker {worker} received shutdown signal");
                if response.send(()).is_err() {
                    tracing::error!("Worker {worker} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    tracing::trace!("Worker {worker} stopped");
}

/// Answers one `[token, count]` message.
///
/// Returns `[token, id_1, ..., id_count]` with every id in decimal, or `None`
/// when the message is rejected or shutdown interrupts the batch. A pending
/// generator is waited on for the duration it asks for, unless shutdown
/// comes first.
pub async fn handle_request<G: ZuidGenerator>(
    worker: usize,
    message: Multipart,
    // `&mut` keeps the future `Send` without requiring `G: Sync`.
    generator: &mut G,
    max_ids_per_request: u64,
    shutdown: &CancellationToken,
) -> Option<Multipart> {
    let request = match IdRequest::parse(message, max_ids_per_request) {
        Ok(request) => request,
        Err(rejection) => {
            tracing::debug!("Worker {worker} dropped request: {rejection}");
            increment_dropped_requests();
            return None;
        }
    };

    increment_requests();
    record_ids_per_request(request.count as f64);

    let capacity = request.count.min(MAX_PREALLOCATED_PARTS) as usize + 1;
    let mut reply = Multipart::with_capacity(capacity);
    reply.push_back(request.token);

    for generated in 0..request.count {
        if generated > 0 && generated % SHUTDOWN_CHECK_INTERVAL == 0 {
            if shutdown.is_cancelled() {
                tracing::debug!("Worker {worker} abandoned a batch at shutdown");
                return None;
            }
            tokio::task::yield_now().await;
        }

        let id = loop {
            match generator.poll_id() {
                IdGenStatus::Ready { id } => break id,
                IdGenStatus::Pending { yield_for } => tokio::select! {
                    () = shutdown.cancelled() => {
                        tracing::debug!("Worker {worker} abandoned a pending batch at shutdown");
                        return None;
                    }
                    () = tokio::time::sleep(yield_for) => {}
                },
            }
        };
        reply.push_back(id.to_string());
    }

    increment_ids_generated(request.count);
    tracing::trace!("Worker {worker} generated {} ids", request.count);
    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use zuid::{
        BasicZuidGenerator, MachineId, StrictZuidGenerator, SystemClock, TimeSource, Timestamp,
        WorkerId, ZuidId,
    };

    struct FixedTime(Timestamp);

    impl TimeSource for FixedTime {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    fn generator() -> BasicZuidGenerator<FixedTime> {
        BasicZuidGenerator::new(
            MachineId::new(3).unwrap(),
            WorkerId::new(2).unwrap(),
            FixedTime(Timestamp::new(1_000_000, 500)),
        )
    }

    fn decode(reply: Multipart) -> (Bytes, Vec<ZuidId>) {
        let mut parts = reply.into_iter();
        let token = parts.next().unwrap();
        let ids = parts
            .map(|part| std::str::from_utf8(&part).unwrap().parse().unwrap())
            .collect();
        (token, ids)
    }

    #[tokio::test]
    async fn replies_with_token_then_ids() {
        let message: Multipart = ["T", "3"].into_iter().collect();
        let reply = handle_request(0, message, &mut generator(), 100, &CancellationToken::new())
            .await
            .unwrap();

        let (token, ids) = decode(reply);
        assert_eq!(token, Bytes::from_static(b"T"));
        assert_eq!(ids.len(), 3);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(id.machine_id(), 3);
            assert_eq!(id.worker_id(), 2);
            assert_eq!(id.sequence(), i as u64);
            assert_eq!(id.seconds(), 1_000_000);
            assert_eq!(id.millis(), 500);
        }
    }

    #[tokio::test]
    async fn rejected_requests_get_no_reply() {
        let mut generator = generator();
        let shutdown = CancellationToken::new();
        for parts in [&["T", "0"][..], &["T", "-3"], &["T", "abc"], &["T", "101"], &["T"]] {
            let message: Multipart = parts.iter().copied().collect();
            assert!(
                handle_request(0, message, &mut generator, 100, &shutdown)
                    .await
                    .is_none(),
                "{parts:?}"
            );
        }
        assert_eq!(generator.sequence(), 0);
    }

    #[tokio::test]
    async fn strict_generator_waits_out_an_exhausted_millisecond() {
        let mut generator = StrictZuidGenerator::new(
            MachineId::new(1).unwrap(),
            WorkerId::new(1).unwrap(),
            SystemClock,
        );
        let count = ZuidId::SEQUENCE_SPACE * 2;
        let message: Multipart = ["T".to_owned(), count.to_string()].into_iter().collect();
        let reply = handle_request(1, message, &mut generator, u64::MAX, &CancellationToken::new())
            .await
            .unwrap();

        let (_, ids) = decode(reply);
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn cancelled_batch_is_abandoned() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let message: Multipart = ["T", "10000"].into_iter().collect();
        assert!(
            handle_request(0, message, &mut generator(), u64::MAX, &shutdown)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn loop_announces_readiness_and_acknowledges_shutdown() {
        let (tx, rx) = mpsc::channel(1);
        let (events_tx, mut events) = mpsc::unbounded_channel();
        let handle = tokio::spawn(worker_loop(
            5,
            rx,
            events_tx,
            generator(),
            100,
            CancellationToken::new(),
        ));

        let ready = events.recv().await.unwrap();
        assert_eq!(ready.worker, 5);
        assert!(ready.reply.is_none());

        let message: Multipart = ["T", "2"].into_iter().collect();
        tx.send(WorkRequest::Generate { message }).await.unwrap();
        let done = events.recv().await.unwrap();
        assert_eq!(done.reply.map(|r| r.len()), Some(3));

        let message: Multipart = ["T", "nope"].into_iter().collect();
        tx.send(WorkRequest::Generate { message }).await.unwrap();
        let dropped = events.recv().await.unwrap();
        assert_eq!(dropped.worker, 5);
        assert!(dropped.reply.is_none());

        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(WorkRequest::Shutdown { response: ack_tx }).await.unwrap();
        ack_rx.await.unwrap();
        handle.await.unwrap();
    }
}
