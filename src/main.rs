use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fleet_ops::config::{DatabaseConfig, EnvironmentConfig};
use fleet_ops::database::DatabaseConnection;
use fleet_ops::repositories::PgEntityStore;
use fleet_ops::routes::create_router;
use fleet_ops::services::notifier::spawn_event_logger;
use fleet_ops::services::{BroadcastNotifier, SystemClock};
use fleet_ops::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fleet_ops=debug,tower_http=info")),
        )
        .init();

    info!("🚚 Fleet Operations - coordination service");
    info!("==========================================");

    let config = EnvironmentConfig::from_env()?;
    let database = DatabaseConnection::connect(&DatabaseConfig::from_env()?).await?;

    let notifier = BroadcastNotifier::new(config.event_channel_capacity);
    let _event_logger = spawn_event_logger(&notifier);

    let addr: SocketAddr = config.server_url().parse()?;
    let state = AppState::new(
        config,
        Arc::new(PgEntityStore::new(database.pool().clone())),
        Arc::new(notifier),
        Arc::new(SystemClock),
    );
    let app = create_router(state);

    info!("🌐 Server listening on http://{}", addr);
    info!("🚛 Trips:");
    info!("   POST  /api/trips - Create trip (draft)");
    info!("   GET   /api/trips - List trips");
    info!("   GET   /api/trips/:id - Get trip");
    info!("   PATCH /api/trips/:id/dispatch - Dispatch trip");
    info!("   PATCH /api/trips/:id/complete - Complete trip");
    info!("   PATCH /api/trips/:id/cancel - Cancel trip");
    info!("🔧 Maintenance:");
    info!("   POST  /api/maintenance - Open maintenance log");
    info!("   GET   /api/maintenance - List maintenance logs");
    info!("   GET   /api/maintenance/:id - Get maintenance log");
    info!("   PUT   /api/maintenance/:id - Update maintenance log");
    info!("   DELETE /api/maintenance/:id - Delete maintenance log");
    info!("   PATCH /api/maintenance/:id/complete - Complete maintenance log");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    info!("👋 Server stopped");
    Ok(())
}

/// Graceful shutdown on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Ctrl+C received, shutting down...");
        },
        _ = terminate => {
            info!("🛑 Termination signal received, shutting down...");
        },
    }
}
