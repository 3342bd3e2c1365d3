use clap::Parser;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use zuid_server::server::{
    config::{CliArgs, DEFAULT_BIND_ADDRESS, DEFAULT_PORT, ServerConfig},
    service::ZuidServer,
    telemetry::{init_telemetry, shutdown_telemetry},
};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    log_startup_info(&config);
    let listener = TcpListener::bind(config.server_addr()).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let result = ZuidServer::new(config).serve(listener, shutdown).await;
    if result.is_ok() {
        tracing::info!("Service shut down successfully");
    }

    shutdown_telemetry(providers);
    result
}

fn log_startup_info(config: &ServerConfig) {
    if config.default_bind {
        tracing::info!("No bind address specified. Using default: {DEFAULT_BIND_ADDRESS}");
    }
    if config.default_port {
        tracing::info!("No port specified. Using default: {DEFAULT_PORT}");
    }

    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting ID service on {} with full config: {:#?}",
            config.server_addr(),
            config
        );
    } else {
        tracing::info!(
            "Starting ID service on {} as machine {} with {} workers",
            config.server_addr(),
            config.machine_id,
            config.num_workers
        );
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
    shutdown.cancel();
}
