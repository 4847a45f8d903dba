//! # Repository Module
//!
//! PostgreSQL implementations of the `comanda_core::repository` traits.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ItemService                                                           │
//! │       │  items.get_item_by_id(&ctx, id)      (trait, CoreResult)       │
//! │       ▼                                                                 │
//! │  PgItemRepository                                                      │
//! │  ├── trait impl: ctx.schema()? then delegate                           │
//! │  └── get_by_id(&schema, id)                  (inherent, DbResult)      │
//! │       │                                                                 │
//! │       │  SELECT ... FROM "bistro"."items" WHERE id = $1                │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row structs (`*Row`) derive `FromRow` and are converted into domain
//! types with validation of every TEXT status column.
//!
//! ## Available Repositories
//!
//! - [`PgItemRepository`](item::PgItemRepository) - items and their add-ons
//! - [`PgGroupItemRepository`](group_item::PgGroupItemRepository) - groups, find-or-create, totals
//! - [`PgOrderRepository`](order::PgOrderRepository) - orders, payments, cascades
//! - [`PgCatalogRepository`](catalog::PgCatalogRepository) - products, quantities, seeding

pub mod catalog;
pub mod group_item;
pub mod item;
pub mod order;

use sqlx::PgConnection;
use uuid::Uuid;

use comanda_core::TenantSchema;

use crate::error::DbError;

/// After an optimistic `UPDATE` touched no row, tells a missing row apart
/// from a stale version.
pub(crate) async fn missing_or_conflict(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    table: &str,
    entity: &str,
    id: Uuid,
) -> DbError {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
        schema.qualify(table)
    );
    match sqlx::query_scalar::<_, bool>(&sql)
        .bind(id)
        .fetch_one(conn)
        .await
    {
        Ok(true) => DbError::conflict(entity, id),
        Ok(false) => DbError::not_found(entity, id),
        Err(e) => e.into(),
    }
}

/// Status filters are bound as `text[]`.
pub(crate) fn status_texts<T: std::fmt::Display>(statuses: &[T]) -> Vec<String> {
    statuses.iter().map(ToString::to_string).collect()
}
