//! # Comanda API
//!
//! HTTP adapter over the coordination services.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Comanda API                                    │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────────────┐│
//! │  │   /orders    │   │   /items     │   │   /group-items               ││
//! │  │              │   │              │   │                              ││
//! │  │ • lifecycle  │   │ • add        │   │ • kitchen queue              ││
//! │  │ • payments   │   │ • start/ready│   │ • groups of an order         ││
//! │  │ • kinds      │   │ • cancel/del │   │                              ││
//! │  └──────┬───────┘   └──────┬───────┘   └──────────────┬───────────────┘│
//! │         └──────────────────┼──────────────────────────┘                │
//! │                            ▼                                            │
//! │                  Tenant extractor (x-tenant-schema)                     │
//! │                            │                                            │
//! │                            ▼                                            │
//! │                 comanda-service::Services                               │
//! │                   │                    │                                │
//! │                   ▼                    ▼                                │
//! │           PostgreSQL (per schema)   MemoryStore                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`].

pub mod config;
pub mod error;
pub mod routes;
pub mod tenant;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use comanda_db::Database;
use comanda_service::{MemoryStore, Repositories, Services};

pub use config::{ApiConfig, ConfigError, StorageBackend};
pub use error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub services: Services,
    /// Present when running against PostgreSQL.
    pub database: Option<Database>,
}

impl AppState {
    pub fn postgres(db: Database) -> Self {
        let catalog = Arc::new(db.catalog());
        let repos = Repositories {
            items: Arc::new(db.items()),
            groups: Arc::new(db.group_items()),
            orders: Arc::new(db.orders()),
            products: catalog.clone(),
            quantities: catalog,
        };
        AppState {
            services: Services::new(repos),
            database: Some(db),
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        AppState {
            services: Services::new(Repositories::memory(store)),
            database: None,
        }
    }
}

/// The full HTTP application.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================
