use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use domain::services::{ChangeFeed, InMemoryStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hospital_portal_api::app::{create_app, AppState};
use hospital_portal_api::config::Config;
use hospital_portal_api::jobs::{JobScheduler, RateLimitPruneJob, StoreProbeJob};
use hospital_portal_api::middleware::{init_metrics, logging::init_logging};
use persistence::listener::ChangeListener;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging).context("Failed to initialize logging")?;
    init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Hospital Portal API v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    let mut scheduler = JobScheduler::new(shutdown.clone());
    let mut background = Vec::new();
    let feed = ChangeFeed::new(config.change_feed.buffer);

    let pool_config = config.database.to_pool_config();
    let (stores, backend) = if pool_config.is_memory() {
        warn!("Running on the in-memory store; data is lost on restart");
        let store = InMemoryStore::new().with_change_feed(feed.clone());
        let stores = store.stores();
        scheduler.register(StoreProbeJob::new(Arc::clone(&stores.health)));
        (stores, "memory")
    } else {
        let pool = persistence::db::create_pool(&pool_config)
            .await
            .context("Failed to connect to database")?;

        info!("Running database migrations...");
        persistence::db::run_migrations(&pool).await?;
        info!("Migrations completed");

        if config.change_feed.enabled {
            let listener =
                ChangeListener::new(pool.clone(), config.change_feed.channel.clone(), feed.clone());
            background.push(listener.spawn(shutdown.clone()));
        }
        let stores = persistence::repositories::postgres_stores(pool.clone());
        scheduler.register(StoreProbeJob::new(Arc::clone(&stores.health)).with_pool(pool));
        (stores, "postgres")
    };

    let addr = config.socket_addr().context("Invalid server address")?;
    let state = AppState::new(config, stores, feed, backend).context("Invalid auth settings")?;
    if let Some(ref limiter) = state.rate_limiter {
        scheduler.register(RateLimitPruneJob::new(Arc::clone(limiter)));
    }
    scheduler.start();

    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    scheduler.wait_for_shutdown(SHUTDOWN_GRACE).await;
    for handle in background {
        if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
            warn!("Background task did not stop in time");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and cancels background work.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
