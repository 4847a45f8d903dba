//! # Item Service
//!
//! Item operations and their cascade onto the item's group and order.
//!
//! ## Adding an Item
//! ```text
//! add_item_order(order, product, quantity, group?)
//!      │
//!      ├── order open?                     else OrderClosed
//!      ├── product has category and size?  else CategoryNotFound / SizeNotFound
//!      ├── group given?  ── yes ─► must belong to the order
//!      │                 └─ no ──► find-or-create open group (order, category)
//!      ├── group accepts items?            else GroupNotStaging
//!      ├── insert item
//!      ├── recompute group totals
//!      └── refresh order totals (a READY order reopens)
//! ```
//!
//! ## Kitchen Progress
//! ```text
//! start_item:  item PENDING→STARTED, group (STAGING→)PENDING→STARTED
//! ready_item:  item STARTED→READY, group READY once all items settle,
//!              order READY once all groups settle
//! cancel_item: item →CANCELLED, group totals recomputed; the group is
//!              cancelled when nothing is left, or readied when the rest
//!              is ready
//! delete_item_order: same settling against the items left behind
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use comanda_core::validation::validate_observation;
use comanda_core::{
    AdditionalItem, CoreError, CoreResult, GroupItem, GroupItemStatus, Item, RequestContext,
};

use crate::cascade::refresh_order;
use crate::Repositories;

// =============================================================================
// Requests & Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddItemRequest {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity_id: Uuid,
    /// Put the item into this group instead of the order's open group for
    /// the product's category.
    #[serde(default)]
    pub group_item_id: Option<Uuid>,
    #[serde(default)]
    pub observation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemIdAndGroupItem {
    pub item_id: Uuid,
    pub group_item_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddAdditionalRequest {
    pub product_id: Uuid,
    pub quantity_id: Uuid,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateQuantityRequest {
    pub quantity_id: Uuid,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct ItemService {
    repos: Repositories,
}

impl ItemService {
    pub fn new(repos: Repositories) -> Self {
        ItemService { repos }
    }

    /// Adds a product to an order and returns where it landed.
    pub async fn add_item_order(
        &self,
        ctx: &RequestContext,
        request: AddItemRequest,
    ) -> CoreResult<ItemIdAndGroupItem> {
        let schema = ctx.schema()?;
        validate_observation(request.observation.as_deref())?;

        let order = self.repos.orders.get_order_by_id(ctx, request.order_id).await?;
        order.ensure_open()?;

        let product = self
            .repos
            .products
            .get_product_by_id(ctx, request.product_id)
            .await?;
        if product.category.is_none() {
            return Err(CoreError::CategoryNotFound);
        }
        if product.size.is_none() {
            return Err(CoreError::SizeNotFound);
        }

        let group = match request.group_item_id {
            Some(group_id) => {
                let group = self.repos.groups.get_group_by_id(ctx, group_id, false).await?;
                if group.order_id != order.id {
                    return Err(CoreError::GroupNotInOrder {
                        group_item_id: group_id.to_string(),
                        order_id: order.id.to_string(),
                    });
                }
                group
            }
            None => {
                let candidate = GroupItem::new(order.id, &product)?;
                self.repos
                    .groups
                    .find_or_create_open_group(ctx, &candidate)
                    .await?
            }
        };
        if !group.can_add_items() {
            return Err(CoreError::GroupNotStaging);
        }

        let quantity = self
            .repos
            .quantities
            .get_quantity_by_id(ctx, request.quantity_id)
            .await?;

        let mut item = Item::from_product(group.id, &product, &quantity)?;
        item.set_observation(request.observation);
        self.repos.items.add_item(ctx, &item).await?;

        let group = self.repos.groups.calculate_total(ctx, group.id).await?;
        refresh_order(&self.repos, ctx, order.id).await?;

        info!(
            schema = %schema,
            order_id = %order.id,
            item_id = %item.id,
            group_item_id = %group.id,
            total = %item.total_price,
            "Item added"
        );

        Ok(ItemIdAndGroupItem {
            item_id: item.id,
            group_item_id: group.id,
        })
    }

    /// The kitchen starts preparing an item.
    pub async fn start_item(&self, ctx: &RequestContext, item_id: Uuid) -> CoreResult<Item> {
        let schema = ctx.schema()?;

        let mut item = self.repos.items.get_item_by_id(ctx, item_id).await?;
        item.start_item()?;

        let mut group = self
            .repos
            .groups
            .get_group_by_id(ctx, item.group_item_id, false)
            .await?;
        let before = group.status;
        if group.status == GroupItemStatus::Staging {
            group.pending_group_item()?;
        }
        group.start_group_item()?;

        self.repos.items.update_item(ctx, &mut item).await?;
        if group.status != before {
            self.repos.groups.update_group_item(ctx, &mut group).await?;
        }

        info!(
            schema = %schema,
            item_id = %item.id,
            group_item_id = %group.id,
            group_status = %group.status,
            "Item started"
        );
        Ok(item)
    }

    /// The kitchen finished an item. Readies the group, and then the order,
    /// when nothing else is left to prepare. Partial readiness is not an
    /// error.
    pub async fn ready_item(&self, ctx: &RequestContext, item_id: Uuid) -> CoreResult<Item> {
        let schema = ctx.schema()?;

        let mut item = self.repos.items.get_item_by_id(ctx, item_id).await?;
        item.ready_item()?;
        self.repos.items.update_item(ctx, &mut item).await?;

        let mut group = self
            .repos
            .groups
            .get_group_by_id(ctx, item.group_item_id, true)
            .await?;

        if group.all_items_ready() && group.status != GroupItemStatus::Ready {
            group.ready_group_item()?;
            self.repos.groups.update_group_item(ctx, &mut group).await?;
            info!(schema = %schema, group_item_id = %group.id, "Group item ready");

            refresh_order(&self.repos, ctx, group.order_id).await?;
        } else {
            debug!(
                schema = %schema,
                group_item_id = %group.id,
                "Group item still has items in preparation"
            );
        }

        info!(schema = %schema, item_id = %item.id, "Item ready");
        Ok(item)
    }

    /// Cancels an item and settles its group: totals are recomputed, an
    /// all-cancelled group is cancelled, and a group whose remaining items
    /// are ready becomes ready.
    pub async fn cancel_item(&self, ctx: &RequestContext, item_id: Uuid) -> CoreResult<Item> {
        let schema = ctx.schema()?;

        let mut item = self.repos.items.get_item_by_id(ctx, item_id).await?;
        item.cancel_item()?;
        self.repos.items.update_item(ctx, &mut item).await?;

        let group = self.repos.groups.calculate_total(ctx, item.group_item_id).await?;
        let group = self.settle_group(ctx, group).await?;
        refresh_order(&self.repos, ctx, group.order_id).await?;

        info!(schema = %schema, item_id = %item.id, "Item cancelled");
        Ok(item)
    }

    /// Removes an item. A group left without items is deleted, otherwise it
    /// is settled against the items that remain.
    pub async fn delete_item_order(&self, ctx: &RequestContext, item_id: Uuid) -> CoreResult<()> {
        let schema = ctx.schema()?;

        let item = self.repos.items.get_item_by_id(ctx, item_id).await?;
        self.repos.items.delete_item(ctx, item.id).await?;

        let group = self
            .repos
            .groups
            .get_group_by_id(ctx, item.group_item_id, true)
            .await?;

        if group.is_empty() {
            self.repos.groups.delete_group_item(ctx, group.id).await?;
            info!(schema = %schema, group_item_id = %group.id, "Empty group item deleted");
        } else {
            let group = self.repos.groups.calculate_total(ctx, group.id).await?;
            self.settle_group(ctx, group).await?;
        }

        refresh_order(&self.repos, ctx, group.order_id).await?;

        info!(schema = %schema, item_id = %item.id, "Item deleted");
        Ok(())
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Swaps the quantity of a pending item. The new quantity must belong to
    /// the item's category.
    pub async fn update_item_quantity(
        &self,
        ctx: &RequestContext,
        item_id: Uuid,
        request: UpdateQuantityRequest,
    ) -> CoreResult<Item> {
        let schema = ctx.schema()?;

        let mut item = self.repos.items.get_item_by_id(ctx, item_id).await?;
        let quantity = self
            .repos
            .quantities
            .get_quantity_by_id(ctx, request.quantity_id)
            .await?;
        item.set_quantity(&quantity)?;

        self.save_and_refresh_totals(ctx, &mut item).await?;
        info!(
            schema = %schema,
            item_id = %item.id,
            quantity = %item.quantity,
            total = %item.total_price,
            "Item quantity changed"
        );
        Ok(item)
    }

    /// Adds an add-on product to a pending item.
    pub async fn add_additional_item(
        &self,
        ctx: &RequestContext,
        item_id: Uuid,
        request: AddAdditionalRequest,
    ) -> CoreResult<Item> {
        let mut item = self.repos.items.get_item_by_id(ctx, item_id).await?;
        let product = self
            .repos
            .products
            .get_product_by_id(ctx, request.product_id)
            .await?;
        let quantity = self
            .repos
            .quantities
            .get_quantity_by_id(ctx, request.quantity_id)
            .await?;

        let additional = AdditionalItem::from_product(item.id, &product, &quantity)?;
        item.add_additional_item(additional)?;

        self.save_and_refresh_totals(ctx, &mut item).await?;
        Ok(item)
    }

    /// Removes an add-on from a pending item.
    pub async fn remove_additional_item(
        &self,
        ctx: &RequestContext,
        item_id: Uuid,
        additional_id: Uuid,
    ) -> CoreResult<Item> {
        let mut item = self.repos.items.get_item_by_id(ctx, item_id).await?;
        item.remove_additional_item(additional_id)?;

        self.save_and_refresh_totals(ctx, &mut item).await?;
        Ok(item)
    }

    pub async fn update_item_observation(
        &self,
        ctx: &RequestContext,
        item_id: Uuid,
        observation: Option<String>,
    ) -> CoreResult<Item> {
        validate_observation(observation.as_deref())?;

        let mut item = self.repos.items.get_item_by_id(ctx, item_id).await?;
        item.set_observation(observation);
        self.repos.items.update_item(ctx, &mut item).await?;
        Ok(item)
    }

    /// Cancels a group whose items are all cancelled, or readies an open
    /// group whose remaining items are all ready.
    async fn settle_group(
        &self,
        ctx: &RequestContext,
        mut group: GroupItem,
    ) -> CoreResult<GroupItem> {
        let schema = ctx.schema()?;
        let open = matches!(
            group.status,
            GroupItemStatus::Staging | GroupItemStatus::Pending | GroupItemStatus::Started
        );
        if !open {
            return Ok(group);
        }

        if group.all_items_cancelled() {
            group.cancel_group_item()?;
            self.repos.groups.update_group_item(ctx, &mut group).await?;
            info!(schema = %schema, group_item_id = %group.id, "Group item cancelled");
        } else if group.status != GroupItemStatus::Staging && group.all_items_ready() {
            group.ready_group_item()?;
            self.repos.groups.update_group_item(ctx, &mut group).await?;
            info!(schema = %schema, group_item_id = %group.id, "Group item ready");
        }
        Ok(group)
    }

    async fn save_and_refresh_totals(&self, ctx: &RequestContext, item: &mut Item) -> CoreResult<()> {
        self.repos.items.update_item(ctx, item).await?;
        let group = self.repos.groups.calculate_total(ctx, item.group_item_id).await?;
        refresh_order(&self.repos, ctx, group.order_id).await?;
        Ok(())
    }
}
