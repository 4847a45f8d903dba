//! # Repository Contracts
//!
//! The storage seams the services are written against. Implementations
//! live in `comanda-db` (PostgreSQL) and `comanda-service::memory`
//! (in-process, for tests and demos).
//!
//! ```text
//!   ItemService / OrderService
//!        │  Arc<dyn ItemRepository>, Arc<dyn GroupItemRepository>, ...
//!        ▼
//!   ┌──────────────────────┐        ┌──────────────────────┐
//!   │ PgItemRepository ... │   or   │ MemoryStore          │
//!   └──────────────────────┘        └──────────────────────┘
//! ```
//!
//! ## Contract shared by every implementation
//! - Every call is scoped by `ctx.schema()`; without a tenant it fails with
//!   `CoreError::SchemaNotSet`.
//! - Missing rows surface as `CoreError::NotFound`.
//! - `update_*` methods compare the entity's `version` with the stored one,
//!   fail with `CoreError::Conflict` on mismatch, and bump `version` on the
//!   passed entity after a successful write.
//! - Methods documented as transactional write everything or nothing.

use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{Product, Quantity};
use crate::error::CoreResult;
use crate::group_item::{GroupItem, GroupItemStatus};
use crate::item::Item;
use crate::order::{Order, OrderStatus, PaymentOrder};
use crate::tenant::RequestContext;

// =============================================================================
// Items
// =============================================================================

#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Inserts the item and its additional items (transactional).
    async fn add_item(&self, ctx: &RequestContext, item: &Item) -> CoreResult<()>;

    /// Writes status, quantity, totals, observation and the full additional
    /// item set (transactional).
    async fn update_item(&self, ctx: &RequestContext, item: &mut Item) -> CoreResult<()>;

    async fn delete_item(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<()>;

    async fn get_item_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Item>;
}

// =============================================================================
// Group Items
// =============================================================================

#[async_trait]
pub trait GroupItemRepository: Send + Sync {
    async fn create_group_item(&self, ctx: &RequestContext, group: &GroupItem) -> CoreResult<()>;

    /// Returns the open (staging or pending) group for
    /// `(candidate.order_id, candidate.category_id)`, inserting `candidate`
    /// when there is none.
    ///
    /// Atomic: two concurrent calls for the same pair return the same group.
    async fn find_or_create_open_group(
        &self,
        ctx: &RequestContext,
        candidate: &GroupItem,
    ) -> CoreResult<GroupItem>;

    /// Writes status and totals. Items are not touched.
    async fn update_group_item(&self, ctx: &RequestContext, group: &mut GroupItem) -> CoreResult<()>;

    /// Deletes the group and any items still attached (transactional).
    async fn delete_group_item(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<()>;

    async fn get_group_by_id(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        with_items: bool,
    ) -> CoreResult<GroupItem>;

    /// Groups in any of `statuses`, oldest first, with items.
    async fn get_groups_by_status(
        &self,
        ctx: &RequestContext,
        statuses: &[GroupItemStatus],
    ) -> CoreResult<Vec<GroupItem>>;

    /// All groups of an order, oldest first, with items.
    async fn get_groups_by_order_id(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
    ) -> CoreResult<Vec<GroupItem>>;

    /// Groups of an order in any of `statuses`, oldest first, with items.
    async fn get_groups_by_order_id_and_status(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        statuses: &[GroupItemStatus],
    ) -> CoreResult<Vec<GroupItem>>;

    /// Reloads the group with its items, recomputes totals, persists them
    /// and returns the refreshed group.
    async fn calculate_total(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<GroupItem> {
        let mut group = self.get_group_by_id(ctx, id, true).await?;
        group.calculate_total_values();
        self.update_group_item(ctx, &mut group).await?;
        Ok(group)
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, ctx: &RequestContext, order: &Order) -> CoreResult<()>;

    /// The full aggregate: groups with items, and payments.
    async fn get_order_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Order>;

    /// Order headers (no groups or payments), newest first.
    async fn get_orders_by_status(
        &self,
        ctx: &RequestContext,
        statuses: &[OrderStatus],
    ) -> CoreResult<Vec<Order>>;

    /// Writes the order row only: status, kind data, totals, observation
    /// and timestamps.
    async fn update_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()>;

    /// Writes the order row and the status of every loaded group
    /// (transactional).
    async fn pending_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()>;

    /// Writes the order row, every loaded group and every loaded item
    /// (transactional).
    async fn cancel_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()>;

    /// Inserts the payment and writes the order's totals (transactional).
    async fn add_payment_order(
        &self,
        ctx: &RequestContext,
        order: &mut Order,
        payment: &PaymentOrder,
    ) -> CoreResult<()>;
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// The product with `category` and `size` populated when they exist.
    async fn get_product_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Product>;
}

#[async_trait]
pub trait QuantityRepository: Send + Sync {
    async fn get_quantity_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Quantity>;
}
