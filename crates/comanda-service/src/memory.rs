//! # In-Memory Repositories
//!
//! [`MemoryStore`] implements every repository trait on plain vectors behind
//! a `tokio::sync::RwLock`, keyed by tenant schema. It backs the service
//! tests and the API's `memory` storage mode.
//!
//! ```text
//! MemoryStore (Clone, shared)
//!   └── RwLock<HashMap<schema, TenantData>>
//!         ├── catalog: categories, sizes, quantities, products
//!         ├── orders    (headers, no groups or payments)
//!         ├── payments
//!         ├── groups    (no items)
//!         └── items     (with additional items)
//! ```
//!
//! Storage rules match `comanda-db`: rows come back in insertion order,
//! updates compare versions, multi-row writes check every version before
//! changing anything, and find-or-create and group totals run under the
//! write lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use comanda_core::repository::{
    GroupItemRepository, ItemRepository, OrderRepository, ProductRepository, QuantityRepository,
};
use comanda_core::{
    Category, CoreError, CoreResult, GroupItem, GroupItemStatus, Item, Order, OrderStatus,
    PaymentOrder, Product, Quantity, RequestContext, Size,
};

#[derive(Debug, Default)]
struct TenantData {
    categories: Vec<Category>,
    sizes: Vec<Size>,
    quantities: Vec<Quantity>,
    products: Vec<Product>,
    orders: Vec<Order>,
    payments: Vec<PaymentOrder>,
    groups: Vec<GroupItem>,
    items: Vec<Item>,
}

impl TenantData {
    fn group_with_items(&self, group: &GroupItem) -> GroupItem {
        let mut group = group.clone();
        group.items = self
            .items
            .iter()
            .filter(|i| i.group_item_id == group.id)
            .cloned()
            .collect();
        group
    }

    fn order_index(&self, id: Uuid) -> CoreResult<usize> {
        self.orders
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| CoreError::not_found("order", id))
    }

    fn group_index(&self, id: Uuid) -> CoreResult<usize> {
        self.groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| CoreError::not_found("group item", id))
    }

    fn item_index(&self, id: Uuid) -> CoreResult<usize> {
        self.items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| CoreError::not_found("item", id))
    }

    /// Index of the stored order, failing on a stale version.
    fn checked_order(&self, order: &Order) -> CoreResult<usize> {
        let idx = self.order_index(order.id)?;
        if self.orders[idx].version != order.version {
            return Err(CoreError::conflict("order", order.id));
        }
        Ok(idx)
    }

    fn checked_group(&self, group: &GroupItem) -> CoreResult<usize> {
        let idx = self.group_index(group.id)?;
        if self.groups[idx].version != group.version {
            return Err(CoreError::conflict("group item", group.id));
        }
        Ok(idx)
    }

    fn checked_item(&self, item: &Item) -> CoreResult<usize> {
        let idx = self.item_index(item.id)?;
        if self.items[idx].version != item.version {
            return Err(CoreError::conflict("item", item.id));
        }
        Ok(idx)
    }
}

/// Stores the order header: groups and payments live in their own tables.
fn order_header(order: &Order) -> Order {
    Order {
        groups: Vec::new(),
        payments: Vec::new(),
        ..order.clone()
    }
}

fn group_header(group: &GroupItem) -> GroupItem {
    GroupItem {
        items: Vec::new(),
        ..group.clone()
    }
}

/// Shared in-process storage for every tenant.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tenants: Arc<RwLock<HashMap<String, TenantData>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read<T>(
        &self,
        ctx: &RequestContext,
        f: impl FnOnce(&TenantData) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let schema = ctx.schema()?;
        let tenants = self.tenants.read().await;
        match tenants.get(schema.as_str()) {
            Some(data) => f(data),
            None => f(&TenantData::default()),
        }
    }

    async fn write<T>(
        &self,
        ctx: &RequestContext,
        f: impl FnOnce(&mut TenantData) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let schema = ctx.schema()?;
        let mut tenants = self.tenants.write().await;
        f(tenants.entry(schema.as_str().to_string()).or_default())
    }

    // =========================================================================
    // Catalog seeding
    // =========================================================================

    pub async fn insert_category(&self, ctx: &RequestContext, category: Category) -> CoreResult<()> {
        self.write(ctx, |data| {
            data.categories.push(category);
            Ok(())
        })
        .await
    }

    pub async fn insert_size(&self, ctx: &RequestContext, size: Size) -> CoreResult<()> {
        self.write(ctx, |data| {
            data.sizes.push(size);
            Ok(())
        })
        .await
    }

    pub async fn insert_quantity(&self, ctx: &RequestContext, quantity: Quantity) -> CoreResult<()> {
        self.write(ctx, |data| {
            data.quantities.push(quantity);
            Ok(())
        })
        .await
    }

    /// Stores a product. Like the database, only `category_id` and
    /// `size_id` are kept; reads join them back in.
    pub async fn insert_product(&self, ctx: &RequestContext, product: Product) -> CoreResult<()> {
        self.write(ctx, |data| {
            data.products.push(Product {
                category: None,
                size: None,
                ..product
            });
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Items
// =============================================================================

#[async_trait]
impl ItemRepository for MemoryStore {
    async fn add_item(&self, ctx: &RequestContext, item: &Item) -> CoreResult<()> {
        self.write(ctx, |data| {
            if data.items.iter().any(|i| i.id == item.id) {
                return Err(CoreError::conflict("item", item.id));
            }
            data.items.push(item.clone());
            Ok(())
        })
        .await
    }

    async fn update_item(&self, ctx: &RequestContext, item: &mut Item) -> CoreResult<()> {
        let now = Utc::now();
        self.write(ctx, |data| {
            let idx = data.checked_item(item)?;
            item.version += 1;
            item.updated_at = now;
            data.items[idx] = item.clone();
            Ok(())
        })
        .await
    }

    async fn delete_item(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<()> {
        self.write(ctx, |data| {
            let idx = data.item_index(id)?;
            data.items.remove(idx);
            Ok(())
        })
        .await
    }

    async fn get_item_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Item> {
        self.read(ctx, |data| {
            let idx = data.item_index(id)?;
            Ok(data.items[idx].clone())
        })
        .await
    }
}

// =============================================================================
// Group Items
// =============================================================================

#[async_trait]
impl GroupItemRepository for MemoryStore {
    async fn create_group_item(&self, ctx: &RequestContext, group: &GroupItem) -> CoreResult<()> {
        self.write(ctx, |data| {
            if data.groups.iter().any(|g| g.id == group.id) {
                return Err(CoreError::conflict("group item", group.id));
            }
            data.groups.push(group_header(group));
            Ok(())
        })
        .await
    }

    async fn find_or_create_open_group(
        &self,
        ctx: &RequestContext,
        candidate: &GroupItem,
    ) -> CoreResult<GroupItem> {
        self.write(ctx, |data| {
            let open = data.groups.iter().find(|g| {
                g.order_id == candidate.order_id
                    && g.category_id == candidate.category_id
                    && GroupItemStatus::OPEN.contains(&g.status)
            });
            if let Some(group) = open {
                return Ok(data.group_with_items(group));
            }

            let group = group_header(candidate);
            data.groups.push(group.clone());
            Ok(group)
        })
        .await
    }

    async fn update_group_item(&self, ctx: &RequestContext, group: &mut GroupItem) -> CoreResult<()> {
        let now = Utc::now();
        self.write(ctx, |data| {
            let idx = data.checked_group(group)?;
            group.version += 1;
            group.updated_at = now;
            data.groups[idx] = group_header(group);
            Ok(())
        })
        .await
    }

    async fn delete_group_item(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<()> {
        self.write(ctx, |data| {
            let idx = data.group_index(id)?;
            data.items.retain(|i| i.group_item_id != id);
            data.groups.remove(idx);
            Ok(())
        })
        .await
    }

    async fn get_group_by_id(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        with_items: bool,
    ) -> CoreResult<GroupItem> {
        self.read(ctx, |data| {
            let group = &data.groups[data.group_index(id)?];
            Ok(if with_items {
                data.group_with_items(group)
            } else {
                group.clone()
            })
        })
        .await
    }

    async fn get_groups_by_status(
        &self,
        ctx: &RequestContext,
        statuses: &[GroupItemStatus],
    ) -> CoreResult<Vec<GroupItem>> {
        self.read(ctx, |data| {
            Ok(data
                .groups
                .iter()
                .filter(|g| statuses.contains(&g.status))
                .map(|g| data.group_with_items(g))
                .collect())
        })
        .await
    }

    async fn get_groups_by_order_id(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
    ) -> CoreResult<Vec<GroupItem>> {
        self.read(ctx, |data| {
            Ok(data
                .groups
                .iter()
                .filter(|g| g.order_id == order_id)
                .map(|g| data.group_with_items(g))
                .collect())
        })
        .await
    }

    async fn get_groups_by_order_id_and_status(
        &self,
        ctx: &RequestContext,
        order_id: Uuid,
        statuses: &[GroupItemStatus],
    ) -> CoreResult<Vec<GroupItem>> {
        self.read(ctx, |data| {
            Ok(data
                .groups
                .iter()
                .filter(|g| g.order_id == order_id && statuses.contains(&g.status))
                .map(|g| data.group_with_items(g))
                .collect())
        })
        .await
    }

    /// Recomputed under the write lock, so concurrent item changes on the
    /// same group never conflict here.
    async fn calculate_total(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<GroupItem> {
        let now = Utc::now();
        self.write(ctx, |data| {
            let idx = data.group_index(id)?;
            let mut group = data.group_with_items(&data.groups[idx]);
            group.calculate_total_values();
            group.version += 1;
            group.updated_at = now;
            data.groups[idx] = group_header(&group);
            Ok(group)
        })
        .await
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn create_order(&self, ctx: &RequestContext, order: &Order) -> CoreResult<()> {
        self.write(ctx, |data| {
            if data.orders.iter().any(|o| o.id == order.id) {
                return Err(CoreError::conflict("order", order.id));
            }
            data.orders.push(order_header(order));
            Ok(())
        })
        .await
    }

    async fn get_order_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Order> {
        self.read(ctx, |data| {
            let mut order = data.orders[data.order_index(id)?].clone();
            order.groups = data
                .groups
                .iter()
                .filter(|g| g.order_id == id)
                .map(|g| data.group_with_items(g))
                .collect();
            order.payments = data
                .payments
                .iter()
                .filter(|p| p.order_id == id)
                .cloned()
                .collect();
            Ok(order)
        })
        .await
    }

    async fn get_orders_by_status(
        &self,
        ctx: &RequestContext,
        statuses: &[OrderStatus],
    ) -> CoreResult<Vec<Order>> {
        self.read(ctx, |data| {
            Ok(data
                .orders
                .iter()
                .rev()
                .filter(|o| statuses.contains(&o.status))
                .cloned()
                .collect())
        })
        .await
    }

    async fn update_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()> {
        let now = Utc::now();
        self.write(ctx, |data| {
            let idx = data.checked_order(order)?;
            order.version += 1;
            order.updated_at = now;
            data.orders[idx] = order_header(order);
            Ok(())
        })
        .await
    }

    async fn pending_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()> {
        let now = Utc::now();
        self.write(ctx, |data| {
            let order_idx = data.checked_order(order)?;
            let group_idx = order
                .groups
                .iter()
                .map(|g| data.checked_group(g))
                .collect::<CoreResult<Vec<_>>>()?;

            order.version += 1;
            order.updated_at = now;
            data.orders[order_idx] = order_header(order);
            for (group, idx) in order.groups.iter_mut().zip(group_idx) {
                group.version += 1;
                group.updated_at = now;
                data.groups[idx] = group_header(group);
            }
            Ok(())
        })
        .await
    }

    async fn cancel_order(&self, ctx: &RequestContext, order: &mut Order) -> CoreResult<()> {
        let now = Utc::now();
        self.write(ctx, |data| {
            let order_idx = data.checked_order(order)?;
            let group_idx = order
                .groups
                .iter()
                .map(|g| data.checked_group(g))
                .collect::<CoreResult<Vec<_>>>()?;
            let item_idx = order
                .groups
                .iter()
                .flat_map(|g| g.items.iter())
                .map(|i| data.checked_item(i))
                .collect::<CoreResult<Vec<_>>>()?;

            order.version += 1;
            order.updated_at = now;
            data.orders[order_idx] = order_header(order);
            for (group, idx) in order.groups.iter_mut().zip(group_idx) {
                group.version += 1;
                group.updated_at = now;
                data.groups[idx] = group_header(group);
            }
            let items = order.groups.iter_mut().flat_map(|g| g.items.iter_mut());
            for (item, idx) in items.zip(item_idx) {
                item.version += 1;
                item.updated_at = now;
                data.items[idx] = item.clone();
            }
            Ok(())
        })
        .await
    }

    async fn add_payment_order(
        &self,
        ctx: &RequestContext,
        order: &mut Order,
        payment: &PaymentOrder,
    ) -> CoreResult<()> {
        let now = Utc::now();
        self.write(ctx, |data| {
            let idx = data.checked_order(order)?;
            data.payments.push(payment.clone());
            order.version += 1;
            order.updated_at = now;
            data.orders[idx] = order_header(order);
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Catalog
// =============================================================================

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn get_product_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Product> {
        self.read(ctx, |data| {
            let mut product = data
                .products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| CoreError::not_found("product", id))?;

            product.category = data
                .categories
                .iter()
                .find(|c| c.id == product.category_id)
                .cloned();
            product.size = product
                .size_id
                .and_then(|size_id| data.sizes.iter().find(|s| s.id == size_id).cloned());
            Ok(product)
        })
        .await
    }
}

#[async_trait]
impl QuantityRepository for MemoryStore {
    async fn get_quantity_by_id(&self, ctx: &RequestContext, id: Uuid) -> CoreResult<Quantity> {
        self.read(ctx, |data| {
            data.quantities
                .iter()
                .find(|q| q.id == id)
                .cloned()
                .ok_or_else(|| CoreError::not_found("quantity", id))
        })
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
