//! # Order Repository
//!
//! ## Storage Layout
//! ```text
//! orders ─┬─1:N──► payment_orders
//!         └─1:N──► group_items ──1:N──► items ──1:N──► item_additionals
//! ```
//!
//! All three order kinds share the `orders` table. The `kind` column says
//! which set of `pickup_*`, `delivery_*` or `table_*` columns is populated.
//!
//! ## Multi-row Writes
//! ```text
//! pending_order      BEGIN → order row → group rows              → COMMIT
//! cancel_order       BEGIN → order row → group rows → item rows  → COMMIT
//! add_payment_order  BEGIN → payment   → order row               → COMMIT
//! ```
//! Versions on the in-memory aggregate are bumped only after COMMIT.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use comanda_core::repository::OrderRepository;
use comanda_core::{
    CoreResult, DeliveryOrder, Money, Order, OrderKind, OrderStatus, PaymentMethod, PaymentOrder,
    PickupOrder, RequestContext, TableOrder, TenantSchema,
};

use crate::error::{DbError, DbResult};
use crate::repository::group_item::{load_groups_for_order, write_group_row};
use crate::repository::item::write_item_row;
use crate::repository::{missing_or_conflict, status_texts};

const ORDER_COLUMNS: &str = "id, status, kind, pickup_name, pickup_status, \
     delivery_client_id, delivery_address_id, delivery_driver_id, delivery_status, \
     table_id, table_waiter_id, table_status, total_payable_cents, total_paid_cents, \
     observation, version, created_at, updated_at, pending_at, finished_at, cancelled_at, \
     archived_at";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    status: String,
    kind: String,
    pickup_name: Option<String>,
    pickup_status: Option<String>,
    delivery_client_id: Option<Uuid>,
    delivery_address_id: Option<Uuid>,
    delivery_driver_id: Option<Uuid>,
    delivery_status: Option<String>,
    table_id: Option<Uuid>,
    table_waiter_id: Option<Uuid>,
    table_status: Option<String>,
    total_payable_cents: i64,
    total_paid_cents: i64,
    observation: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pending_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn kind(&self) -> DbResult<OrderKind> {
        let invalid = |reason: &str| DbError::invalid_data("order", self.id, reason);

        match self.kind.as_str() {
            "pickup" => Ok(OrderKind::Pickup(PickupOrder {
                name: self.pickup_name.clone().unwrap_or_default(),
                status: parse_optional(self.id, self.pickup_status.as_deref())?,
            })),
            "delivery" => Ok(OrderKind::Delivery(DeliveryOrder {
                client_id: self
                    .delivery_client_id
                    .ok_or_else(|| invalid("delivery without client"))?,
                address_id: self
                    .delivery_address_id
                    .ok_or_else(|| invalid("delivery without address"))?,
                driver_id: self.delivery_driver_id,
                status: parse_optional(self.id, self.delivery_status.as_deref())?,
            })),
            "table" => Ok(OrderKind::Table(TableOrder {
                table_id: self.table_id.ok_or_else(|| invalid("table order without table"))?,
                waiter_id: self.table_waiter_id,
                status: parse_optional(self.id, self.table_status.as_deref())?,
            })),
            other => Err(invalid(&format!("unknown order kind '{}'", other))),
        }
    }

    fn into_order(self) -> DbResult<Order> {
        let kind = self.kind()?;
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| DbError::invalid_data("order", self.id, e))?;

        Ok(Order {
            id: self.id,
            status,
            kind,
            groups: Vec::new(),
            payments: Vec::new(),
            total_payable: Money::from_cents(self.total_payable_cents),
            total_paid: Money::from_cents(self.total_paid_cents),
            observation: self.observation,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            pending_at: self.pending_at,
            finished_at: self.finished_at,
            cancelled_at: self.cancelled_at,
            archived_at: self.archived_at,
        })
    }
}

/// Kind status columns are NULL for other kinds; a missing value means the
/// kind's initial status.
fn parse_optional<T>(order_id: Uuid, text: Option<&str>) -> DbResult<T>
where
    T: Default + std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match text {
        None => Ok(T::default()),
        Some(s) => s
            .parse()
            .map_err(|e| DbError::invalid_data("order", order_id, e)),
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    order_id: Uuid,
    method: String,
    amount_cents: i64,
    paid_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> DbResult<PaymentOrder> {
        let method: PaymentMethod = self
            .method
            .parse()
            .map_err(|e| DbError::invalid_data("payment", self.id, e))?;

        Ok(PaymentOrder {
            id: self.id,
            order_id: self.order_id,
            method,
            amount: Money::from_cents(self.amount_cents),
            paid_at: self.paid_at,
        })
    }
}

/// The kind-specific columns of an order, flattened.
#[derive(Debug, Default)]
struct KindColumns<'a> {
    pickup_name: Option<&'a str>,
    pickup_status: Option<&'static str>,
    delivery_client_id: Option<Uuid>,
    delivery_address_id: Option<Uuid>,
    delivery_driver_id: Option<Uuid>,
    delivery_status: Option<&'static str>,
    table_id: Option<Uuid>,
    table_waiter_id: Option<Uuid>,
    table_status: Option<&'static str>,
}

impl<'a> From<&'a OrderKind> for KindColumns<'a> {
    fn from(kind: &'a OrderKind) -> Self {
        match kind {
            OrderKind::Pickup(p) => KindColumns {
                pickup_name: Some(&p.name),
                pickup_status: Some(p.status.as_str()),
                ..Default::default()
            },
            OrderKind::Delivery(d) => KindColumns {
                delivery_client_id: Some(d.client_id),
                delivery_address_id: Some(d.address_id),
                delivery_driver_id: d.driver_id,
                delivery_status: Some(d.status.as_str()),
                ..Default::default()
            },
            OrderKind::Table(t) => KindColumns {
                table_id: Some(t.table_id),
                table_waiter_id: t.waiter_id,
                table_status: Some(t.status.as_str()),
                ..Default::default()
            },
        }
    }
}

// =============================================================================
// Shared Queries
// =============================================================================

async fn write_order_row(
    conn: &mut PgConnection,
    schema: &TenantSchema,
    order: &Order,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let kind = KindColumns::from(&order.kind);
    let sql = format!(
        "UPDATE {} SET status = $2, pickup_name = $3, pickup_status = $4, \
         delivery_client_id = $5, delivery_address_id = $6, delivery_driver_id = $7, \
         delivery_status = $8, table_id = $9, table_waiter_id = $10, table_status = $11, \
         total_payable_cents = $12, total_paid_cents = $13, observation = $14, \
         pending_at = $15, finished_at = $16, cancelled_at = $17, archived_at = $18, \
         version = version + 1, updated_at = $19 \
         WHERE id = $1 AND version = $20",
        schema.qualify("orders")
    );

    let result = sqlx::query(&sql)
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(kind.pickup_name)
        .bind(kind.pickup_status)
        .bind(kind.delivery_client_id)
        .bind(kind.delivery_address_id)
        .bind(kind.delivery_driver_id)
        .bind(kind.delivery_status)
        .bind(kind.table_id)
        .bind(kind.table_waiter_id)
        .bind(kind.table_status)
        .bind(order.total_payable.cents())
        .bind(order.total_paid.cents())
        .bind(&order.observation)
        .bind(order.pending_at)
        .bind(order.finished_at)
        .bind(order.cancelled_at)
        .bind(order.archived_at)
        .bind(now)
        .bind(order.version)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(missing_or_conflict(conn, schema, "orders", "order", order.id).await);
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        PgOrderRepository { pool }
    }

    pub async fn insert(&self, schema: &TenantSchema, order: &Order) -> DbResult<()> {
        debug!(schema = %schema, order_id = %order.id, kind = order.kind.name(), "Inserting order");

        let kind = KindColumns::from(&order.kind);
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
             $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)",
            schema.qualify("orders"),
            ORDER_COLUMNS
        );

        sqlx::query(&sql)
            .bind(order.id)
            .bind(order.status.as_str())
            .bind(order.kind.name())
            .bind(kind.pickup_name)
            .bind(kind.pickup_status)
            .bind(kind.delivery_client_id)
            .bind(kind.delivery_address_id)
            .bind(kind.delivery_driver_id)
            .bind(kind.delivery_status)
            .bind(kind.table_id)
            .bind(kind.table_waiter_id)
            .bind(kind.table_status)
            .bind(order.total_payable.cents())
            .bind(order.total_paid.cents())
            .bind(&order.observation)
            .bind(order.version)
            .bind(order.created_at)
            .bind(order.updated_at)
            .bind(order.pending_at)
            .bind(order.finished_at)
            .bind(order.cancelled_at)
            .bind(order.archived_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Loads the full aggregate: groups with items, and payments.
    pub async fn get_by_id(&self, schema: &TenantSchema, id: Uuid) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            ORDER_COLUMNS,
            schema.qualify("orders")
        );
        let row: OrderRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("order", id))?;
        let mut order = row.into_order()?;

        order.groups = load_groups_for_order(&mut conn, schema, id).await?;

        let payments = format!(
            "SELECT id, order_id, method, amount_cents, paid_at FROM {} \
             WHERE order_id = $1 ORDER BY paid_at, id",
            schema.qualify("payment_orders")
        );
        let rows: Vec<PaymentRow> = sqlx::query_as(&payments)
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
        order.payments = rows
            .into_iter()
            .map(PaymentRow::into_payment)
            .collect::<DbResult<_>>()?;

        Ok(order)
    }

    /// Order headers in any of `statuses`, newest first.
    pub async fn list_by_status(
        &self,
        schema: &TenantSchema,
        statuses: &[OrderStatus],
    ) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE status = ANY($1) ORDER BY created_at DESC, id",
            ORDER_COLUMNS,
            schema.qualify("orders")
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(status_texts(statuses))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    pub async fn update(&self, schema: &TenantSchema, order: &mut Order) -> DbResult<()> {
        debug!(
            schema = %schema,
            order_id = %order.id,
            status = %order.status,
            version = order.version,
            "Updating order"
        );

        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;
        write_order_row(&mut conn, schema, order, now).await?;

        order.version += 1;
        order.updated_at = now;
        Ok(())
    }

    /// Writes the order and the status of every loaded group.
    pub async fn save_pending(&self, schema: &TenantSchema, order: &mut Order) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        write_order_row(&mut tx, schema, order, now).await?;
        for group in &order.groups {
            write_group_row(&mut tx, schema, group, now).await?;
        }

        tx.commit().await?;

        order.version += 1;
        order.updated_at = now;
        for group in &mut order.groups {
            group.version += 1;
            group.updated_at = now;
        }

        info!(schema = %schema, order_id = %order.id, groups = order.groups.len(), "Order sent to kitchen");
        Ok(())
    }

    /// Writes the order, every loaded group and every loaded item.
    pub async fn save_cancelled(&self, schema: &TenantSchema, order: &mut Order) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        write_order_row(&mut tx, schema, order, now).await?;
        for group in &order.groups {
            write_group_row(&mut tx, schema, group, now).await?;
            for item in &group.items {
                write_item_row(&mut tx, schema, item, now).await?;
            }
        }

        tx.commit().await?;

        order.version += 1;
        order.updated_at = now;
        for group in &mut order.groups {
            group.version += 1;
            group.updated_at = now;
            for item in &mut group.items {
                item.version += 1;
                item.updated_at = now;
            }
        }

        info!(schema = %schema, order_id = %order.id, "Order cancelled");
        Ok(())
    }

    /// Inserts the payment and writes the order's totals.
    pub async fn save_payment(
        &self,
        schema: &TenantSchema,
        order: &mut Order,
        payment: &PaymentOrder,
    ) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO {} (id, order_id, method, amount_cents, paid_at) \
             VALUES ($1, $2, $3, $4, $5)",
            schema.qualify("payment_orders")
        );
        sqlx::query(&sql)
            .bind(payment.id)
            .bind(payment.order_id)
            .bind(payment.method.as_str())
            .bind(payment.amount.cents())
            .bind(payment.paid_at)
            .execute(&mut *tx)
            .await?;

        write_order_row(&mut tx, schema, order, now).await?;

        tx.commit().await?;

        order.version += 1;
        order.updated_at = now;

        info!(
            schema = %schema,
            order_id = %order.id,
            method = %payment.method,
            amount = %payment.amount,
            "Payment recorded"
        );
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_order(&self, ctx: &RequestContext, order: &Order) -> CoreResult<()> {
        Ok(self.insert(ctx.schema()?, order).await?)
    }

    async fn get_order_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Order> {
        Ok(self.get_by_id(ctx.schema()?, id).await?)
    }

    async fn get_orders_by_status(
        &self,
        ctx: &RequestContext,
        statuses: &[OrderStatus],
    ) -> CoreResult<Vec<Order>> {
        Ok(self.list_by_status(ctx.schema()?, statuses).await?)
    }

    async fn update_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()> {
        Ok(self.update(ctx.schema()?, order).await?)
    }

    async fn pending_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()> {
        Ok(self.save_pending(ctx.schema()?, order).await?)
    }

    async fn cancel_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()> {
        Ok(self.save_cancelled(ctx.schema()?, order).await?)
    }

    async fn add_payment_order(
        &self,
        ctx: &RequestContext,
        order: &mut Order,
        payment: &PaymentOrder,
    ) -> CoreResult<()> {
        Ok(self.save_payment(ctx.schema()?, order, payment).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
