//! # Item
//!
//! One ordered product instance inside a group item.
//!
//! ## State Machine
//! ```text
//!   ┌─────────┐  start   ┌─────────┐  ready   ┌───────┐
//!   │ PENDING │ ───────► │ STARTED │ ───────► │ READY │
//!   └────┬────┘          └────┬────┘          └───────┘
//!        │ cancel             │ cancel
//!        ▼                    ▼
//!   ┌─────────────────────────────┐
//!   │          CANCELLED          │
//!   └─────────────────────────────┘
//! ```
//! READY and CANCELLED are terminal. A cancelled item stays in storage and
//! is skipped by every total computation.
//!
//! ## Snapshot Pattern
//! Name, size, price and cost are copied from the product when the item is
//! created, so later catalog edits never rewrite an open order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::{Product, Quantity};
use crate::error::{CoreError, CoreResult};
use crate::macros::text_enum;
use crate::money::{Money, Multiplier};

// =============================================================================
// Item Status
// =============================================================================

/// Preparation status of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Ordered, kitchen has not touched it.
    #[default]
    Pending,
    /// Kitchen is preparing it.
    Started,
    /// Done.
    Ready,
    /// Withdrawn before it was ready.
    Cancelled,
}

text_enum!(ItemStatus, "item status" {
    Pending => "pending",
    Started => "started",
    Ready => "ready",
    Cancelled => "cancelled",
});

// =============================================================================
// Additional Item
// =============================================================================

/// An add-on chosen for an item (extra cheese, a side sauce).
///
/// Add-ons follow their parent item's lifecycle and have no status of
/// their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AdditionalItem {
    pub id: Uuid,
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub quantity_id: Uuid,
    pub quantity: Multiplier,
    pub unit_price: Money,
    pub unit_cost: Money,
    pub total_price: Money,
    pub total_cost: Money,
}

impl AdditionalItem {
    /// Builds an add-on from a catalog product.
    pub fn from_product(item_id: Uuid, product: &Product, quantity: &Quantity) -> CoreResult<Self> {
        ensure_orderable(product, quantity)?;

        Ok(AdditionalItem {
            id: Uuid::new_v4(),
            item_id,
            product_id: product.id,
            name: product.name.clone(),
            quantity_id: quantity.id,
            quantity: quantity.value,
            unit_price: product.price,
            unit_cost: product.cost,
            total_price: product.price.times(quantity.value),
            total_cost: product.cost.times(quantity.value),
        })
    }
}

// =============================================================================
// Item
// =============================================================================

/// A line in a group item: product × quantity plus add-ons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    pub id: Uuid,
    pub group_item_id: Uuid,
    pub product_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub size: String,
    pub quantity_id: Uuid,
    pub quantity: Multiplier,
    pub unit_price: Money,
    pub unit_cost: Money,
    /// `unit_price × quantity + Σ additional total_price`
    pub total_price: Money,
    pub total_cost: Money,
    pub status: ItemStatus,
    pub observation: Option<String>,
    pub additional_items: Vec<AdditionalItem>,
    /// Optimistic concurrency token, bumped by every persisted update.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Builds a new PENDING item from a product and one of its category's
    /// quantities.
    ///
    /// ## Errors
    /// - `CategoryNotFound` / `SizeNotFound` when the product's relations
    ///   were not resolved
    /// - `ProductUnavailable` when the product is switched off
    /// - `QuantityNotInCategory` when the quantity belongs elsewhere
    pub fn from_product(
        group_item_id: Uuid,
        product: &Product,
        quantity: &Quantity,
    ) -> CoreResult<Self> {
        ensure_orderable(product, quantity)?;
        let size = product.size.as_ref().ok_or(CoreError::SizeNotFound)?;

        let now = Utc::now();
        let mut item = Item {
            id: Uuid::new_v4(),
            group_item_id,
            product_id: product.id,
            category_id: product.category_id,
            name: product.name.clone(),
            size: size.name.clone(),
            quantity_id: quantity.id,
            quantity: quantity.value,
            unit_price: product.price,
            unit_cost: product.cost,
            total_price: Money::zero(),
            total_cost: Money::zero(),
            status: ItemStatus::Pending,
            observation: None,
            additional_items: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        item.calculate_total();
        Ok(item)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// PENDING → STARTED.
    pub fn start_item(&mut self) -> CoreResult<()> {
        if self.status != ItemStatus::Pending {
            return Err(CoreError::invalid_transition("item", self.status, "start"));
        }
        self.status = ItemStatus::Started;
        Ok(())
    }

    /// STARTED → READY.
    pub fn ready_item(&mut self) -> CoreResult<()> {
        if self.status != ItemStatus::Started {
            return Err(CoreError::invalid_transition("item", self.status, "ready"));
        }
        self.status = ItemStatus::Ready;
        Ok(())
    }

    /// PENDING | STARTED → CANCELLED.
    pub fn cancel_item(&mut self) -> CoreResult<()> {
        match self.status {
            ItemStatus::Pending | ItemStatus::Started => {
                self.status = ItemStatus::Cancelled;
                Ok(())
            }
            other => Err(CoreError::invalid_transition("item", other, "cancel")),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ItemStatus::Cancelled
    }

    /// Ready or cancelled: nothing left for the kitchen to do.
    pub fn is_settled(&self) -> bool {
        matches!(self.status, ItemStatus::Ready | ItemStatus::Cancelled)
    }

    // =========================================================================
    // Edits (pending only)
    // =========================================================================

    /// Replaces the quantity and recomputes totals.
    pub fn set_quantity(&mut self, quantity: &Quantity) -> CoreResult<()> {
        self.ensure_editable("change quantity of")?;
        if quantity.category_id != self.category_id {
            return Err(CoreError::QuantityNotInCategory {
                quantity_id: quantity.id.to_string(),
                category_id: self.category_id.to_string(),
            });
        }
        self.quantity_id = quantity.id;
        self.quantity = quantity.value;
        self.calculate_total();
        Ok(())
    }

    pub fn add_additional_item(&mut self, additional: AdditionalItem) -> CoreResult<()> {
        self.ensure_editable("add additional to")?;
        self.additional_items.push(additional);
        self.calculate_total();
        Ok(())
    }

    /// Removes an add-on, returning it.
    pub fn remove_additional_item(&mut self, additional_id: Uuid) -> CoreResult<AdditionalItem> {
        self.ensure_editable("remove additional from")?;
        let pos = self
            .additional_items
            .iter()
            .position(|a| a.id == additional_id)
            .ok_or_else(|| CoreError::not_found("additional item", additional_id))?;
        let removed = self.additional_items.remove(pos);
        self.calculate_total();
        Ok(removed)
    }

    pub fn set_observation(&mut self, observation: Option<String>) {
        self.observation = observation.filter(|o| !o.trim().is_empty());
    }

    /// Recomputes `total_price` and `total_cost` from scratch.
    pub fn calculate_total(&mut self) {
        let additional_price: Money = self.additional_items.iter().map(|a| a.total_price).sum();
        let additional_cost: Money = self.additional_items.iter().map(|a| a.total_cost).sum();

        self.total_price = self.unit_price.times(self.quantity) + additional_price;
        self.total_cost = self.unit_cost.times(self.quantity) + additional_cost;
    }

    fn ensure_editable(&self, action: &'static str) -> CoreResult<()> {
        if self.status != ItemStatus::Pending {
            return Err(CoreError::invalid_transition("item", self.status, action));
        }
        Ok(())
    }
}

fn ensure_orderable(product: &Product, quantity: &Quantity) -> CoreResult<()> {
    if product.category.is_none() {
        return Err(CoreError::CategoryNotFound);
    }
    if !product.is_available {
        return Err(CoreError::ProductUnavailable(product.id.to_string()));
    }
    if quantity.category_id != product.category_id {
        return Err(CoreError::QuantityNotInCategory {
            quantity_id: quantity.id.to_string(),
            category_id: product.category_id.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
