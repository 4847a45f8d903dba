//! # Item Repository
//!
//! Items and their additional items.
//!
//! ```text
//! items ──1:N──► item_additionals (ON DELETE CASCADE, ordered by position)
//! ```
//!
//! An item is always written together with its full add-on set, inside one
//! transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use comanda_core::repository::ItemRepository;
use comanda_core::{
    AdditionalItem, CoreResult, Item, ItemStatus, Money, Multiplier, RequestContext, TenantSchema,
};

use crate::error::{DbError, DbResult};
use crate::repository::missing_or_conflict;

const ITEM_COLUMNS: &str = "id, group_item_id, product_id, category_id, name, size, \
     quantity_id, quantity_thousandths, unit_price_cents, unit_cost_cents, \
     total_price_cents, total_cost_cents, status, observation, version, created_at, updated_at";

const ADDITIONAL_COLUMNS: &str = "id, item_id, product_id, name, quantity_id, \
     quantity_thousandths, unit_price_cents, unit_cost_cents, total_price_cents, total_cost_cents";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
pub(crate) struct ItemRow {
    id: Uuid,
    group_item_id: Uuid,
    product_id: Uuid,
    category_id: Uuid,
    name: String,
    size: String,
    quantity_id: Uuid,
    quantity_thousandths: i64,
    unit_price_cents: i64,
    unit_cost_cents: i64,
    total_price_cents: i64,
    total_cost_cents: i64,
    status: String,
    observation: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self, additional_items: Vec<AdditionalItem>) -> DbResult<Item> {
        let status: ItemStatus = self
            .status
            .parse()
            .map_err(|e| DbError::invalid_data("item", self.id, e))?;

        Ok(Item {
            id: self.id,
            group_item_id: self.group_item_id,
            product_id: self.product_id,
            category_id: self.category_id,
            name: self.name,
            size: self.size,
            quantity_id: self.quantity_id,
            quantity: Multiplier::from_thousandths(self.quantity_thousandths),
            unit_price: Money::from_cents(self.unit_price_cents),
            unit_cost: Money::from_cents(self.unit_cost_cents),
            total_price: Money::from_cents(self.total_price_cents),
            total_cost: Money::from_cents(self.total_cost_cents),
            status,
            observation: self.observation,
            additional_items,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AdditionalRow {
    id: Uuid,
    item_id: Uuid,
    product_id: Uuid,
    name: String,
    quantity_id: Uuid,
    quantity_thousandths: i64,
    unit_price_cents: i64,
    unit_cost_cents: i64,
    total_price_cents: i64,
    total_cost_cents: i64,
}

impl From<AdditionalRow> for AdditionalItem {
    fn from(row: AdditionalRow) -> Self {
        AdditionalItem {
            id: row.id,
            item_id: row.item_id,
            product_id: row.product_id,
            name: row.name,
            quantity_id: row.quantity_id,
            quantity: Multiplier::from_thousandths(row.quantity_thousandths),
            unit_price: Money::from_cents(row.unit_price_cents),
            unit_cost: Money::from_cents(row.unit_cost_cents),
            total_price: Money::from_cents(row.total_price_cents),
            total_cost: Money::from_cents(row.total_cost_cents),
        }
    }
}

// =============================================================================
// Shared Queries
// =============================================================================

/// Loads every item of the given groups, with add-ons, oldest first.
pub(crate) async fn load_items_for_groups(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    group_ids: &[Uuid],
) -> DbResult<Vec<Item>> {
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {} FROM {} WHERE group_item_id = ANY($1) ORDER BY created_at, id",
        ITEM_COLUMNS,
        schema.qualify("items")
    );
    let rows: Vec<ItemRow> = sqlx::query_as(&sql)
        .bind(group_ids)
        .fetch_all(&mut *conn)
        .await?;

    let item_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut additionals = load_additionals(conn, schema, &item_ids).await?;

    rows.into_iter()
        .map(|row| {
            let extras = additionals.remove(&row.id).unwrap_or_default();
            row.into_item(extras)
        })
        .collect()
}

async fn load_additionals(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    item_ids: &[Uuid],
) -> DbResult<HashMap<Uuid, Vec<AdditionalItem>>> {
    let mut by_item: HashMap<Uuid, Vec<AdditionalItem>> = HashMap::new();
    if item_ids.is_empty() {
        return Ok(by_item);
    }

    let sql = format!(
        "SELECT {} FROM {} WHERE item_id = ANY($1) ORDER BY item_id, position",
        ADDITIONAL_COLUMNS,
        schema.qualify("item_additionals")
    );
    let rows: Vec<AdditionalRow> = sqlx::query_as(&sql)
        .bind(item_ids)
        .fetch_all(&mut *conn)
        .await?;

    for row in rows {
        by_item.entry(row.item_id).or_default().push(row.into());
    }
    Ok(by_item)
}

async fn insert_additionals(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    additionals: &[AdditionalItem],
) -> DbResult<()> {
    let sql = format!(
        "INSERT INTO {} (id, item_id, position, product_id, name, quantity_id, \
         quantity_thousandths, unit_price_cents, unit_cost_cents, total_price_cents, \
         total_cost_cents) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        schema.qualify("item_additionals")
    );

    for (position, additional) in additionals.iter().enumerate() {
        sqlx::query(&sql)
            .bind(additional.id)
            .bind(additional.item_id)
            .bind(position as i32)
            .bind(additional.product_id)
            .bind(&additional.name)
            .bind(additional.quantity_id)
            .bind(additional.quantity.thousandths())
            .bind(additional.unit_price.cents())
            .bind(additional.unit_cost.cents())
            .bind(additional.total_price.cents())
            .bind(additional.total_cost.cents())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Optimistic write of an item row (not its add-ons).
pub(crate) async fn write_item_row(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    item: &Item,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let sql = format!(
        "UPDATE {} SET quantity_id = $2, quantity_thousandths = $3, total_price_cents = $4, \
         total_cost_cents = $5, status = $6, observation = $7, version = version + 1, \
         updated_at = $8 WHERE id = $1 AND version = $9",
        schema.qualify("items")
    );

    let result = sqlx::query(&sql)
        .bind(item.id)
        .bind(item.quantity_id)
        .bind(item.quantity.thousandths())
        .bind(item.total_price.cents())
        .bind(item.total_cost.cents())
        .bind(item.status.as_str())
        .bind(&item.observation)
        .bind(now)
        .bind(item.version)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(missing_or_conflict(conn, schema, "items", "item", item.id).await);
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        PgItemRepository { pool }
    }

    /// Gets an item with its add-ons.
    pub async fn get_by_id(&self, schema: &TenantSchema, id: Uuid) -> DbResult<Item> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            ITEM_COLUMNS,
            schema.qualify("items")
        );
        let row: ItemRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("item", id))?;

        let mut additionals = load_additionals(&mut conn, schema, &[row.id]).await?;
        let extras = additionals.remove(&row.id).unwrap_or_default();
        row.into_item(extras)
    }

    /// Inserts an item and its add-ons.
    pub async fn insert(&self, schema: &TenantSchema, item: &Item) -> DbResult<()> {
        debug!(
            schema = %schema,
            item_id = %item.id,
            group_item_id = %item.group_item_id,
            "Inserting item"
        );

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
             $13, $14, $15, $16, $17)",
            schema.qualify("items"),
            ITEM_COLUMNS
        );
        sqlx::query(&sql)
            .bind(item.id)
            .bind(item.group_item_id)
            .bind(item.product_id)
            .bind(item.category_id)
            .bind(&item.name)
            .bind(&item.size)
            .bind(item.quantity_id)
            .bind(item.quantity.thousandths())
            .bind(item.unit_price.cents())
            .bind(item.unit_cost.cents())
            .bind(item.total_price.cents())
            .bind(item.total_cost.cents())
            .bind(item.status.as_str())
            .bind(&item.observation)
            .bind(item.version)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await?;

        insert_additionals(&mut tx, schema, &item.additional_items).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Writes the item row and replaces its add-ons.
    pub async fn update(&self, schema: &TenantSchema, item: &mut Item) -> DbResult<()> {
        debug!(
            schema = %schema,
            item_id = %item.id,
            status = %item.status,
            version = item.version,
            "Updating item"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        write_item_row(&mut tx, schema, item, now).await?;

        let delete = format!(
            "DELETE FROM {} WHERE item_id = $1",
            schema.qualify("item_additionals")
        );
        sqlx::query(&delete).bind(item.id).execute(&mut *tx).await?;
        insert_additionals(&mut tx, schema, &item.additional_items).await?;

        tx.commit().await?;

        item.version += 1;
        item.updated_at = now;
        Ok(())
    }

    /// Deletes an item. Add-ons go with it.
    pub async fn delete(&self, schema: &TenantSchema, id: Uuid) -> DbResult<()> {
        debug!(schema = %schema, item_id = %id, "Deleting item");

        let sql = format!("DELETE FROM {} WHERE id = $1", schema.qualify("items"));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("item", id));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn add_item(&self, ctx: &RequestContext, item: &Item) -> CoreResult<()> {
        Ok(self.insert(ctx.schema()?, item).await?)
    }

    async fn update_item(&self, ctx: &RequestContext, item: &mut Item) -> CoreResult<()> {
        Ok(self.update(ctx.schema()?, item).await?)
    }

    async fn delete_item(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<()> {
        Ok(self.delete(ctx.schema()?, id).await?)
    }

    async fn get_item_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Item> {
        Ok(self.get_by_id(ctx.schema()?, id).await?)
    }
}
