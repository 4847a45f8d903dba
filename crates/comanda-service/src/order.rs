//! # Order Service
//!
//! Order lifecycle, payments and the pickup / delivery / table steps.
//!
//! ```text
//! create_order ─► STAGING ─pending_order─► PENDING ◄──────► READY
//!                    │                      │  │  (item cascade)│
//!                    │                      │  └──archive──► ARCHIVED
//!                    └──── cancel_order ────┴── finish_order ──┴─► FINISHED
//! ```
//!
//! `pending_order` and `cancel_order` write the order together with its
//! groups (and, for cancel, their items) in one repository call.

use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use comanda_core::validation::{validate_observation, validate_pickup_name};
use comanda_core::{
    CoreResult, Money, Order, OrderKind, OrderStatus, PaymentMethod, PaymentOrder, RequestContext,
};

use crate::cascade::refresh_order;
use crate::Repositories;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderRequest {
    pub kind: OrderKind,
    #[serde(default)]
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddPaymentRequest {
    pub method: PaymentMethod,
    pub amount: Money,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct OrderService {
    repos: Repositories,
}

impl OrderService {
    pub fn new(repos: Repositories) -> Self {
        OrderService { repos }
    }

    pub async fn create_order(
        &self,
        ctx: &RequestContext,
        request: CreateOrderRequest,
    ) -> CoreResult<Order> {
        let schema = ctx.schema()?;

        if let OrderKind::Pickup(pickup) = &request.kind {
            validate_pickup_name(&pickup.name)?;
        }
        validate_observation(request.observation.as_deref())?;

        let mut order = Order::new(request.kind);
        order.set_observation(request.observation);
        self.repos.orders.create_order(ctx, &order).await?;

        info!(schema = %schema, order_id = %order.id, kind = order.kind.name(), "Order created");
        Ok(order)
    }

    /// The full order: groups with items, and payments.
    pub async fn get_order(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        self.repos.orders.get_order_by_id(ctx, order_id).await
    }

    pub async fn orders_by_status(
        &self,
        ctx: &RequestContext,
        statuses: &[OrderStatus],
    ) -> CoreResult<Vec<Order>> {
        self.repos.orders.get_orders_by_status(ctx, statuses).await
    }

    /// Sends a staging order to the kitchen along with its staging groups.
    pub async fn pending_order(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        let schema = ctx.schema()?;

        let mut order = self.repos.orders.get_order_by_id(ctx, order_id).await?;
        order.pending_order()?;
        order.calculate_total();
        self.repos.orders.pending_order(ctx, &mut order).await?;

        info!(
            schema = %schema,
            order_id = %order.id,
            groups = order.groups.len(),
            total = %order.total_payable,
            "Order pending"
        );
        Ok(order)
    }

    pub async fn finish_order(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        self.transition(ctx, order_id, "finish", Order::finish_order).await
    }

    /// Cancels the order, every group not yet ready and their unfinished
    /// items.
    pub async fn cancel_order(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        let schema = ctx.schema()?;

        let mut order = self.repos.orders.get_order_by_id(ctx, order_id).await?;
        order.cancel_order()?;
        self.repos.orders.cancel_order(ctx, &mut order).await?;

        info!(schema = %schema, order_id = %order.id, "Order cancelled");
        Ok(order)
    }

    pub async fn archive_order(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        self.transition(ctx, order_id, "archive", Order::archive_order).await
    }

    /// Brings an archived order back as PENDING, or straight to READY when
    /// its kitchen work is already done.
    pub async fn unarchive_order(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        self.transition(ctx, order_id, "unarchive", Order::unarchive_order).await?;
        refresh_order(&self.repos, ctx, order_id).await
    }

    pub async fn add_payment(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        request: AddPaymentRequest,
    ) -> CoreResult<Order> {
        let schema = ctx.schema()?;

        let mut order = self.repos.orders.get_order_by_id(ctx, order_id).await?;
        let payment = PaymentOrder::new(order.id, request.method, request.amount);
        order.add_payment(payment.clone())?;
        self.repos
            .orders
            .add_payment_order(ctx, &mut order, &payment)
            .await?;

        info!(
            schema = %schema,
            order_id = %order.id,
            method = %payment.method,
            amount = %payment.amount,
            balance = %order.balance(),
            "Payment added"
        );
        Ok(order)
    }

    pub async fn update_observation(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        observation: Option<String>,
    ) -> CoreResult<Order> {
        validate_observation(observation.as_deref())?;
        self.transition(ctx, order_id, "update observation", move |order| {
            order.set_observation(observation);
            Ok(())
        })
        .await
    }

    // =========================================================================
    // Kinds
    // =========================================================================

    pub async fn launch_pickup(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        self.transition(ctx, order_id, "launch pickup", Order::launch_pickup).await
    }

    pub async fn pick_up(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        self.transition(ctx, order_id, "pick up", Order::pick_up).await
    }

    pub async fn launch_delivery(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        driver_id: Uuid,
    ) -> CoreResult<Order> {
        self.transition(ctx, order_id, "launch delivery", move |order| {
            order.launch_delivery(driver_id)
        })
        .await
    }

    pub async fn finish_delivery(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        self.transition(ctx, order_id, "finish delivery", Order::finish_delivery).await
    }

    pub async fn update_delivery_driver(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        driver_id: Uuid,
    ) -> CoreResult<Order> {
        self.transition(ctx, order_id, "update driver", move |order| {
            order.update_delivery_driver(driver_id)
        })
        .await
    }

    pub async fn close_table(&self, ctx: &RequestContext, order_id: Uuid) -> CoreResult<Order> {
        self.transition(ctx, order_id, "close table", Order::close_table).await
    }

    /// Load, apply, write the order row.
    async fn transition<F>(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        action: &'static str,
        apply: F,
    ) -> CoreResult<Order>
    where
        F: FnOnce(&mut Order) -> CoreResult<()> + Send,
    {
        let schema = ctx.schema()?;

        let mut order = self.repos.orders.get_order_by_id(ctx, order_id).await?;
        apply(&mut order)?;
        self.repos.orders.update_order(ctx, &mut order).await?;

        info!(schema = %schema, order_id = %order.id, action, status = %order.status, "Order updated");
        Ok(order)
    }
}
