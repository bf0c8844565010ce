use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

mod handlers;
mod middleware;
mod routes;
mod state;

use common::config::Settings;
use common::connector::{ProcessLauncher, SyncOptions, SyncProcess, WebContentRoot};
use common::db::repositories::PgMessageResolver;
use common::db::DbPool;
use common::properties::PropertiesFile;
use common::store::PgConnectorStore;
use common::telemetry;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Settings::load()?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(
        &config.observability.log_level,
        config.observability.tracing_endpoint.as_deref(),
    )?;
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting BI connector API"
    );

    let metrics_handle = telemetry::install_metrics_recorder()?;

    // Initialize database connection pool
    let db_pool = DbPool::new(&config.database).await?;
    db_pool.health_check().await?;
    tracing::info!("Database connection pool established");

    let store = Arc::new(PgConnectorStore::new(db_pool.clone()));
    let messages = Arc::new(PgMessageResolver::new(db_pool.clone()));
    let launcher = ProcessLauncher::new(
        config.launcher.interpreter.clone(),
        Arc::new(WebContentRoot::new(config.launcher.web_content_root.clone())),
    )
    .with_capture_output(config.launcher.capture_output);

    let sync = SyncProcess::new(
        store.clone(),
        Arc::new(launcher),
        messages.clone(),
        Arc::new(PropertiesFile::new(config.properties.path.clone())),
    )
    .with_options(SyncOptions::from(&config.launcher));

    let state = AppState::new(store, sync, messages).with_metrics(metrics_handle);

    let app = routes::create_router(state);

    // Start server
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    telemetry::shutdown_tracer();
    tracing::info!("API server stopped");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Initiating graceful shutdown");
}
