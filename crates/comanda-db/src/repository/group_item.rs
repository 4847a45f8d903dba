//! # Group Item Repository
//!
//! ## Find-or-create
//! ```text
//! INSERT candidate ... ON CONFLICT (order_id, category_id)
//!                      WHERE status IN ('staging', 'pending') DO NOTHING
//!        │
//!        ▼
//! SELECT the open group for (order_id, category_id)
//! ```
//! The partial unique index `group_items_one_open_per_category` makes the
//! insert a no-op when another request already opened the group, so two
//! concurrent calls always end up on the same row.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use comanda_core::repository::GroupItemRepository;
use comanda_core::{
    CoreResult, GroupItem, GroupItemStatus, Item, Money, RequestContext, TenantSchema,
};

use crate::error::{DbError, DbResult};
use crate::repository::item::load_items_for_groups;
use crate::repository::{missing_or_conflict, status_texts};

const GROUP_COLUMNS: &str = "id, order_id, category_id, size, need_print, status, \
     total_price_cents, total_cost_cents, version, created_at, updated_at";

/// Rounds of insert-then-select before find-or-create gives up. A round only
/// fails when the open group is closed between the two statements.
const FIND_OR_CREATE_ATTEMPTS: usize = 3;

#[derive(Debug, FromRow)]
pub(crate) struct GroupRow {
    id: Uuid,
    order_id: Uuid,
    category_id: Uuid,
    size: String,
    need_print: bool,
    status: String,
    total_price_cents: i64,
    total_cost_cents: i64,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, items: Vec<Item>) -> DbResult<GroupItem> {
        let status: GroupItemStatus = self
            .status
            .parse()
            .map_err(|e| DbError::invalid_data("group item", self.id, e))?;

        Ok(GroupItem {
            id: self.id,
            order_id: self.order_id,
            category_id: self.category_id,
            size: self.size,
            need_print: self.need_print,
            status,
            items,
            total_price: Money::from_cents(self.total_price_cents),
            total_cost: Money::from_cents(self.total_cost_cents),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// =============================================================================
// Shared Queries
// =============================================================================

/// Converts group rows, loading all of their items in two queries.
pub(crate) async fn attach_items(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    rows: Vec<GroupRow>,
) -> DbResult<Vec<GroupItem>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let mut by_group: HashMap<Uuid, Vec<Item>> = HashMap::new();
    for item in load_items_for_groups(conn, schema, &ids).await? {
        by_group.entry(item.group_item_id).or_default().push(item);
    }

    rows.into_iter()
        .map(|row| {
            let items = by_group.remove(&row.id).unwrap_or_default();
            row.into_group(items)
        })
        .collect()
}

/// Groups of one order, oldest first, with items.
pub(crate) async fn load_groups_for_order(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    order_id: Uuid,
) -> DbResult<Vec<GroupItem>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE order_id = $1 ORDER BY created_at, id",
        GROUP_COLUMNS,
        schema.qualify("group_items")
    );
    let rows: Vec<GroupRow> = sqlx::query_as(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

    attach_items(conn, schema, rows).await
}

/// Optimistic write of a group's status and totals.
pub(crate) async fn write_group_row(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    group: &GroupItem,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let sql = format!(
        "UPDATE {} SET status = $2, total_price_cents = $3, total_cost_cents = $4, \
         version = version + 1, updated_at = $5 WHERE id = $1 AND version = $6",
        schema.qualify("group_items")
    );

    let result = sqlx::query(&sql)
        .bind(group.id)
        .bind(group.status.as_str())
        .bind(group.total_price.cents())
        .bind(group.total_cost.cents())
        .bind(now)
        .bind(group.version)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(missing_or_conflict(conn, schema, "group_items", "group item", group.id).await);
    }
    Ok(())
}

async fn insert_group_row(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    group: &GroupItem,
    on_conflict: &str,
) -> DbResult<u64> {
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) {}",
        schema.qualify("group_items"),
        GROUP_COLUMNS,
        on_conflict
    );

    let result = sqlx::query(&sql)
        .bind(group.id)
        .bind(group.order_id)
        .bind(group.category_id)
        .bind(&group.size)
        .bind(group.need_print)
        .bind(group.status.as_str())
        .bind(group.total_price.cents())
        .bind(group.total_cost.cents())
        .bind(group.version)
        .bind(group.created_at)
        .bind(group.updated_at)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for group item database operations.
#[derive(Debug, Clone)]
pub struct PgGroupItemRepository {
    pool: PgPool,
}

impl PgGroupItemRepository {
    pub fn new(pool: PgPool) -> Self {
        PgGroupItemRepository { pool }
    }

    pub async fn insert(&self, schema: &TenantSchema, group: &GroupItem) -> DbResult<()> {
        debug!(schema = %schema, group_item_id = %group.id, order_id = %group.order_id, "Inserting group item");

        let mut conn = self.pool.acquire().await?;
        insert_group_row(&mut conn, schema, group, "").await?;
        Ok(())
    }

    /// Returns the open group for the candidate's order and category,
    /// inserting the candidate when there is none.
    pub async fn find_or_create_open(
        &self,
        schema: &TenantSchema,
        candidate: &GroupItem,
    ) -> DbResult<GroupItem> {
        let mut conn = self.pool.acquire().await?;

        let select = format!(
            "SELECT {} FROM {} WHERE order_id = $1 AND category_id = $2 \
             AND status IN ('staging', 'pending')",
            GROUP_COLUMNS,
            schema.qualify("group_items")
        );

        for attempt in 1..=FIND_OR_CREATE_ATTEMPTS {
            let inserted = insert_group_row(
                &mut conn,
                schema,
                candidate,
                "ON CONFLICT (order_id, category_id) \
                 WHERE status IN ('staging', 'pending') DO NOTHING",
            )
            .await?;

            let row: Option<GroupRow> = sqlx::query_as(&select)
                .bind(candidate.order_id)
                .bind(candidate.category_id)
                .fetch_optional(&mut *conn)
                .await?;

            if let Some(row) = row {
                debug!(
                    schema = %schema,
                    group_item_id = %row.id,
                    created = inserted == 1,
                    "Resolved open group item"
                );
                let mut groups = attach_items(&mut conn, schema, vec![row]).await?;
                return groups
                    .pop()
                    .ok_or_else(|| DbError::Internal("group item vanished".to_string()));
            }

            warn!(
                schema = %schema,
                order_id = %candidate.order_id,
                attempt,
                "Open group item closed while resolving, retrying"
            );
        }

        Err(DbError::Internal(format!(
            "could not resolve an open group item for order {}",
            candidate.order_id
        )))
    }

    pub async fn update(&self, schema: &TenantSchema, group: &mut GroupItem) -> DbResult<()> {
        debug!(
            schema = %schema,
            group_item_id = %group.id,
            status = %group.status,
            version = group.version,
            "Updating group item"
        );

        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;
        write_group_row(&mut conn, schema, group, now).await?;

        group.version += 1;
        group.updated_at = now;
        Ok(())
    }

    /// Deletes the group together with any items still attached.
    pub async fn delete(&self, schema: &TenantSchema, id: Uuid) -> DbResult<()> {
        debug!(schema = %schema, group_item_id = %id, "Deleting group item");

        let mut tx = self.pool.begin().await?;

        let items = format!("DELETE FROM {} WHERE group_item_id = $1", schema.qualify("items"));
        sqlx::query(&items).bind(id).execute(&mut *tx).await?;

        let group = format!("DELETE FROM {} WHERE id = $1", schema.qualify("group_items"));
        let result = sqlx::query(&group).bind(id).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("group item", id));
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_by_id(
        &self,
        schema: &TenantSchema,
        id: Uuid,
        with_items: bool,
    ) -> DbResult<GroupItem> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            GROUP_COLUMNS,
            schema.qualify("group_items")
        );
        let row: GroupRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("group item", id))?;

        if !with_items {
            return row.into_group(Vec::new());
        }

        let mut groups = attach_items(&mut conn, schema, vec![row]).await?;
        groups
            .pop()
            .ok_or_else(|| DbError::not_found("group item", id))
    }

    pub async fn list_by_status(
        &self,
        schema: &TenantSchema,
        statuses: &[GroupItemStatus],
    ) -> DbResult<Vec<GroupItem>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM {} WHERE status = ANY($1) ORDER BY created_at, id",
            GROUP_COLUMNS,
            schema.qualify("group_items")
        );
        let rows: Vec<GroupRow> = sqlx::query_as(&sql)
            .bind(status_texts(statuses))
            .fetch_all(&mut *conn)
            .await?;

        attach_items(&mut conn, schema, rows).await
    }

    pub async fn list_by_order(
        &self,
        schema: &TenantSchema,
        order_id: Uuid,
    ) -> DbResult<Vec<GroupItem>> {
        let mut conn = self.pool.acquire().await?;
        load_groups_for_order(&mut conn, schema, order_id).await
    }

    pub async fn list_by_order_and_status(
        &self,
        schema: &TenantSchema,
        order_id: Uuid,
        statuses: &[GroupItemStatus],
    ) -> DbResult<Vec<GroupItem>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM {} WHERE order_id = $1 AND status = ANY($2) ORDER BY created_at, id",
            GROUP_COLUMNS,
            schema.qualify("group_items")
        );
        let rows: Vec<GroupRow> = sqlx::query_as(&sql)
            .bind(order_id)
            .bind(status_texts(statuses))
            .fetch_all(&mut *conn)
            .await?;

        attach_items(&mut conn, schema, rows).await
    }

    /// Recomputes the group's totals from its non-cancelled items in a
    /// single statement and returns the refreshed group.
    pub async fn recalculate_totals(&self, schema: &TenantSchema, id: Uuid) -> DbResult<GroupItem> {
        let items = schema.qualify("items");
        let sql = format!(
            "UPDATE {groups} SET \
             total_price_cents = COALESCE((SELECT SUM(total_price_cents) FROM {items} \
                 WHERE group_item_id = $1 AND status <> 'cancelled'), 0)::BIGINT, \
             total_cost_cents = COALESCE((SELECT SUM(total_cost_cents) FROM {items} \
                 WHERE group_item_id = $1 AND status <> 'cancelled'), 0)::BIGINT, \
             version = version + 1, updated_at = NOW() \
             WHERE id = $1",
            groups = schema.qualify("group_items"),
            items = items
        );

        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("group item", id));
        }

        self.get_by_id(schema, id, true).await
    }
}

#[async_trait]
impl GroupItemRepository for PgGroupItemRepository {
    async fn create_group_item(&self, ctx: &RequestContext, group: &GroupItem) -> CoreResult<()> {
        Ok(self.insert(ctx.schema()?, group).await?)
    }

    async fn find_or_create_open_group(
        &self,
        ctx: &RequestContext,
        candidate: &GroupItem,
    ) -> CoreResult<GroupItem> {
        Ok(self.find_or_create_open(ctx.schema()?, candidate).await?)
    }

    async fn update_group_item(&self, ctx: &RequestContext, group: &mut GroupItem) -> CoreResult<()> {
        Ok(self.update(ctx.schema()?, group).await?)
    }

    async fn delete_group_item(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<()> {
        Ok(self.delete(ctx.schema()?, id).await?)
    }

    async fn get_group_by_id(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        with_items: bool,
    ) -> CoreResult<GroupItem> {
        Ok(self.get_by_id(ctx.schema()?, id, with_items).await?)
    }

    async fn get_groups_by_status(
        &self,
        ctx: &RequestContext,
        statuses: &[GroupItemStatus],
    ) -> CoreResult<Vec<GroupItem>> {
        Ok(self.list_by_status(ctx.schema()?, statuses).await?)
    }

    async fn get_groups_by_order_id(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
    ) -> CoreResult<Vec<GroupItem>> {
        Ok(self.list_by_order(ctx.schema()?, order_id).await?)
    }

    async fn get_groups_by_order_id_and_status(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        statuses: &[GroupItemStatus],
    ) -> CoreResult<Vec<GroupItem>> {
        Ok(self
            .list_by_order_and_status(ctx.schema()?, order_id, statuses)
            .await?)
    }

    async fn calculate_total(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<GroupItem> {
        Ok(self.recalculate_totals(ctx.schema()?, id).await?)
    }
}
