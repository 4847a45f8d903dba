//! # Database Pool Management
//!
//! Connection pool creation and configuration for PostgreSQL.
//!
//! ## Lifecycle
//! ```text
//! DbConfig::new(url).max_connections(n)
//!      │
//!      ▼
//! Database::new(config)            one PgPool for the whole server
//!      │
//!      ├── migrate_schema("bistro")   ─►  "bistro".items, "bistro".orders ...
//!      ├── migrate_schema("cafe")     ─►  "cafe".items,   "cafe".orders ...
//!      │
//!      ▼
//! items() / group_items() / orders() / catalog()
//!      repositories share the pool; the tenant comes from each call's
//!      RequestContext
//! ```
//!
//! Pooled connections never change `search_path`. Each query names its
//! tables as `"tenant"."table"`, so one pool serves all tenants and the
//! prepared statement cache cannot mix tenants up.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

use comanda_core::TenantSchema;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::catalog::PgCatalogRepository;
use crate::repository::group_item::PgGroupItemRepository;
use crate::repository::item::PgItemRepository;
use crate::repository::order::PgOrderRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("postgres://comanda@localhost/comanda")
///     .max_connections(20)
///     .min_connections(2);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL connection string.
    pub database_url: String,

    /// Pool size. Default: 10
    pub max_connections: u32,

    /// Connections kept open while idle. Default: 1
    pub min_connections: u32,

    /// Time to wait for a free connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Default: 10 minutes
    pub idle_timeout: Duration,
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        DbConfig {
            database_url: database_url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the acquire timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the shared pool. Clones share it.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new(url)).await?;
/// db.migrate_schema(&"bistro".parse()?).await?;
///
/// let items: Arc<dyn ItemRepository> = Arc::new(db.items());
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Creates the connection pool.
    ///
    /// Migrations are per tenant and run separately through
    /// [`Database::migrate_schema`].
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            max_connections = config.max_connections,
            "Initializing database connection"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect(&config.database_url)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!("Database pool created");
        Ok(Database { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Database { pool }
    }

    /// Creates the tenant schema if needed and applies pending migrations.
    pub async fn migrate_schema(&self, schema: &TenantSchema) -> DbResult<()> {
        migrations::run_for_schema(&self.pool, schema).await
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the item repository.
    pub fn items(&self) -> PgItemRepository {
        PgItemRepository::new(self.pool.clone())
    }

    /// Returns the group item repository.
    pub fn group_items(&self) -> PgGroupItemRepository {
        PgGroupItemRepository::new(self.pool.clone())
    }

    /// Returns the order repository.
    pub fn orders(&self) -> PgOrderRepository {
        PgOrderRepository::new(self.pool.clone())
    }

    /// Returns the catalog repository (products and quantities).
    pub fn catalog(&self) -> PgCatalogRepository {
        PgCatalogRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections, then closes the pool.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// `SELECT 1` round trip.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
