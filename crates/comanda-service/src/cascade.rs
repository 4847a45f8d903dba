//! Order-level follow-up shared by the services.

use tracing::info;
use uuid::Uuid;

use comanda_core::{CoreResult, Order, OrderStatus, RequestContext};

use crate::Repositories;

/// Reloads the order, recomputes its totals and moves it between PENDING and
/// READY to match its groups. Writes only when something changed.
///
/// ```text
/// PENDING + every group ready/cancelled (≥1 ready)  → READY
/// READY   + a group still open or in the kitchen    → PENDING
/// ```
pub(crate) async fn refresh_order(
    repos: &Repositories,
    ctx: &RequestContext,
    order_id: Uuid,
) -> CoreResult<Order> {
    let mut order = repos.orders.get_order_by_id(ctx, order_id).await?;
    let before = (order.status, order.total_payable, order.total_paid);

    order.calculate_total();
    match order.status {
        OrderStatus::Pending if order.all_groups_ready() => order.ready_order()?,
        OrderStatus::Ready if !order.all_groups_ready() => order.reopen_order()?,
        _ => {}
    }

    if (order.status, order.total_payable, order.total_paid) != before {
        repos.orders.update_order(ctx, &mut order).await?;
        if order.status != before.0 {
            info!(order_id = %order.id, from = %before.0, to = %order.status, "Order status changed");
        }
    }
    Ok(order)
}
