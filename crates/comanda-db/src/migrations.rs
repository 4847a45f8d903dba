//! # Tenant Schema Migrations
//!
//! Embedded SQL migrations, applied once per tenant schema.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Per-Tenant Migration Process                          │
//! │                                                                         │
//! │  migrate_schema("bistro")                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Open a dedicated connection (not from the pool)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CREATE SCHEMA IF NOT EXISTS "bistro"                                  │
//! │  SET search_path TO "bistro"                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run embedded migrations                                               │
//! │  ("bistro"._sqlx_migrations tracks what ran in THIS schema)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Close the connection, pooled connections never see search_path        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create `migrations/postgres/NNNN_description.sql`
//! 2. Use unqualified table names, the search_path points at the tenant
//! 3. **NEVER** modify existing migrations, always add new ones

use sqlx::{Connection, PgConnection, PgPool};
use tracing::info;

use comanda_core::TenantSchema;

use crate::error::DbResult;

/// Embedded migrations from the `migrations/postgres` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Creates the tenant schema if needed and applies pending migrations to it.
///
/// Idempotent: safe to run at every startup.
pub async fn run_for_schema(pool: &PgPool, schema: &TenantSchema) -> DbResult<()> {
    info!(schema = %schema, "Applying tenant migrations");

    let options = pool.connect_options();
    let mut conn = PgConnection::connect_with(&*options).await?;

    let create = format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", schema);
    sqlx::query(&create).execute(&mut conn).await?;

    let search_path = format!("SET search_path TO \"{}\"", schema);
    sqlx::query(&search_path).execute(&mut conn).await?;

    MIGRATOR.run(&mut conn).await?;
    conn.close().await?;

    info!(schema = %schema, "Tenant migrations applied");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)` for a tenant schema.
///
/// A schema that was never migrated reports zero applied migrations.
pub async fn migration_status(pool: &PgPool, schema: &TenantSchema) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
         WHERE table_schema = $1 AND table_name = '_sqlx_migrations')",
    )
    .bind(schema.as_str())
    .fetch_one(pool)
    .await?;

    if !exists {
        return Ok((total, 0));
    }

    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE success",
        schema.qualify("_sqlx_migrations")
    );
    let applied: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;

    Ok((total, applied as usize))
}
