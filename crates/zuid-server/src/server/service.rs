use crate::server::{config::ServerConfig, pool::manager::WorkerPool, proxy::broker::Broker};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// The id service: a worker pool behind a proxy on one listener.
#[derive(Debug, Clone)]
pub struct ZuidServer {
    config: ServerConfig,
}

impl ZuidServer {
    pub const fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Serves clients on `listener` until `shutdown` is cancelled, then
    /// stops every worker.
    ///
    /// # Errors
    ///
    /// Returns an error if no worker could be started.
    pub async fn serve(self, listener: TcpListener, shutdown: CancellationToken) -> anyhow::Result<()> {
        let pool = WorkerPool::spawn(&self.config, shutdown.child_token());
        if pool.is_empty() {
            anyhow::bail!("no workers were started");
        }
        tracing::debug!("Started {} workers", pool.len());

        let pool = Broker::new(pool, shutdown).run(listener).await;

        tracing::info!("Refusing new requests");
        pool.shutdown().await;
        Ok(())
    }
}
