//! # comanda-db: PostgreSQL Storage for Comanda
//!
//! Implements the repository traits from `comanda-core` against PostgreSQL,
//! with one schema per tenant.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Comanda Data Flow                               │
//! │                                                                         │
//! │  POST /items  (x-tenant-schema: bistro)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ItemService::add_item_order(&ctx, ...)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    comanda-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │    │                    │  │ (embedded, │  │   │
//! │  │   │               │◄───│ PgItemRepository   │  │ per schema)│  │   │
//! │  │   │ PgPool shared │    │ PgGroupItemRepo... │  │            │  │   │
//! │  │   │ by tenants    │    │ PgOrderRepository  │  │ 0001_...   │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  PostgreSQL:  "bistro".orders  "bistro".group_items  ...        │   │
//! │  │               "corner".orders  "corner".group_items  ...        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded migrations, applied per tenant schema
//! - [`error`] - Database error types and their mapping onto `CoreError`
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new(database_url)).await?;
//! db.migrate_schema(&"bistro".parse()?).await?;
//!
//! let items: Arc<dyn ItemRepository> = Arc::new(db.items());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::PgCatalogRepository;
pub use repository::group_item::PgGroupItemRepository;
pub use repository::item::PgItemRepository;
pub use repository::order::PgOrderRepository;
