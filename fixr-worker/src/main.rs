//! # Fixr Worker
//!
//! Runs the task handlers (welcome emails) against the Redis queue.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p fixr-worker
//! ```

use fixr_shared::redis::RedisClient;
use fixr_worker::config::WorkerConfig;
use fixr_worker::service::JobService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fixr_worker=debug,fixr_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Fixr Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;
    let redis = RedisClient::connect(config.redis.clone()).await?;
    let service = JobService::start(&redis, &config).await?;

    tracing::info!(
        concurrency = config.server.concurrency,
        "Worker ready and listening for tasks"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, draining workers...");
    service.stop().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
