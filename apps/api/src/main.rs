//! # Comanda API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Startup Sequence                                │
//! │                                                                         │
//! │  load config ──► init tracing ──► open storage ──► serve HTTP           │
//! │                                     │                                   │
//! │                                     ├─ postgres: migrate every tenant   │
//! │                                     └─ memory:   empty store            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use comanda_api::{build_router, ApiConfig, AppState, StorageBackend};
use comanda_db::{Database, DbConfig};
use comanda_service::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApiConfig::load()?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Comanda API server...");
    info!(
        addr = %config.bind_address(),
        storage = ?config.storage,
        tenants = config.tenants.len(),
        "Configuration loaded"
    );

    let state = match config.storage {
        StorageBackend::Postgres => {
            let db = Database::new(
                DbConfig::new(config.database_url.as_str())
                    .max_connections(config.db_max_connections),
            )
            .await?;
            info!("Connected to PostgreSQL");

            for schema in config.tenant_schemas()? {
                db.migrate_schema(&schema).await?;
                info!(schema = %schema, "Tenant schema migrated");
            }
            AppState::postgres(db)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on shutdown");
            AppState::memory(MemoryStore::new())
        }
    };
    let database = state.database.clone();

    let app = build_router(state);
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %config.bind_address(), "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
