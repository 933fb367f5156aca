//! # Fixr API Server
//!
//! Multi-tenant catalog API: categories and the service tree, plus the
//! webhook that queues welcome emails for the worker.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p fixr-api
//! ```

use fixr_api::app::{build_router, AppState};
use fixr_api::config::Config;
use fixr_api::services::Services;
use fixr_shared::db::migrations::run_migrations;
use fixr_shared::db::pool::{close_pool, create_pool};
use fixr_shared::jobs::JobClient;
use fixr_shared::redis::RedisClient;
use fixr_shared::repository::Repositories;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fixr_api=debug,fixr_shared=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Fixr API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let db = create_pool(config.database.clone()).await?;
    run_migrations(&db).await?;

    let redis = RedisClient::connect(config.redis.clone()).await?;
    let services = Services::new(
        Repositories::new(db.clone()),
        JobClient::new(redis.connection()),
    );
    let bind_address = config.bind_address();
    let state = AppState::new(services, db.clone(), redis, config);
    let services = state.services.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, releasing resources...");
    services.job.close();
    close_pool(db).await;

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

    tracing::info!("Shutdown signal received, draining connections...");
}
