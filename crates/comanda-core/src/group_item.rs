//! # Group Item
//!
//! The kitchen's unit of work: every item of one order that shares a
//! preparation category.
//!
//! ## State Machine
//! ```text
//! ┌─────────┐ pending ┌─────────┐ start ┌─────────┐ ready ┌───────┐
//! │ STAGING │ ──────► │ PENDING │ ────► │ STARTED │ ────► │ READY │
//! └────┬────┘         └────┬────┘       └────┬────┘       └───────┘
//!      │                   │ cancel          │
//!      └───────────────────┴─────────────────┴────► CANCELLED
//! ```
//!
//! - Items may only be added while STAGING or PENDING.
//! - STARTED requires at least one started or ready item.
//! - READY requires every item to be ready or cancelled, with at least one
//!   ready.
//! - A group with no items is deleted, never stored empty.
//!
//! ## Totals
//! `total_price` is recomputed from the loaded item set every time, never
//! kept as a running sum:
//! ```text
//! total_price = Σ item.total_price   for item.status != CANCELLED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Product;
use crate::error::{CoreError, CoreResult};
use crate::item::{Item, ItemStatus};
use crate::macros::text_enum;
use crate::money::Money;

// =============================================================================
// Group Item Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GroupItemStatus {
    /// Open, the order has not been sent to the kitchen yet.
    #[default]
    Staging,
    /// Sent to the kitchen, waiting.
    Pending,
    Started,
    Ready,
    Cancelled,
}

text_enum!(GroupItemStatus, "group item status" {
    Staging => "staging",
    Pending => "pending",
    Started => "started",
    Ready => "ready",
    Cancelled => "cancelled",
});

impl GroupItemStatus {
    /// Statuses in which a group still accepts new items. At most one group
    /// per (order, category) may be in one of these.
    pub const OPEN: [GroupItemStatus; 2] = [GroupItemStatus::Staging, GroupItemStatus::Pending];
}

// =============================================================================
// Group Item
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GroupItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub category_id: Uuid,
    /// Size label of the product that opened the group.
    pub size: String,
    /// Whether a kitchen ticket must be printed.
    pub need_print: bool,
    pub status: GroupItemStatus,
    /// Loaded on demand; empty when fetched without items.
    pub items: Vec<Item>,
    pub total_price: Money,
    pub total_cost: Money,
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl GroupItem {
    /// Opens a new STAGING group for the product's category.
    pub fn new(order_id: Uuid, product: &Product) -> CoreResult<Self> {
        let category = product.category.as_ref().ok_or(CoreError::CategoryNotFound)?;
        let size = product.size.as_ref().ok_or(CoreError::SizeNotFound)?;

        let now = Utc::now();
        Ok(GroupItem {
            id: Uuid::new_v4(),
            order_id,
            category_id: category.id,
            size: size.name.clone(),
            need_print: category.need_print,
            status: GroupItemStatus::Staging,
            items: Vec::new(),
            total_price: Money::zero(),
            total_cost: Money::zero(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn can_add_items(&self) -> bool {
        GroupItemStatus::OPEN.contains(&self.status)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.status, GroupItemStatus::Ready | GroupItemStatus::Cancelled)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every loaded item is ready or cancelled, and at least one is ready.
    pub fn all_items_ready(&self) -> bool {
        self.items.iter().all(Item::is_settled)
            && self.items.iter().any(|i| i.status == ItemStatus::Ready)
    }

    /// Non-empty and every loaded item is cancelled.
    pub fn all_items_cancelled(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(Item::is_cancelled)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// STAGING → PENDING. No-op when already PENDING.
    pub fn pending_group_item(&mut self) -> CoreResult<()> {
        match self.status {
            GroupItemStatus::Staging => {
                self.status = GroupItemStatus::Pending;
                Ok(())
            }
            GroupItemStatus::Pending => Ok(()),
            other => Err(CoreError::invalid_transition("group item", other, "send")),
        }
    }

    /// PENDING → STARTED. No-op when already STARTED or READY.
    pub fn start_group_item(&mut self) -> CoreResult<()> {
        match self.status {
            GroupItemStatus::Pending => {
                self.status = GroupItemStatus::Started;
                Ok(())
            }
            GroupItemStatus::Started | GroupItemStatus::Ready => Ok(()),
            other => Err(CoreError::invalid_transition("group item", other, "start")),
        }
    }

    /// → READY, provided every loaded item is ready or cancelled.
    ///
    /// Callers must load the group with its items first; on an empty item
    /// list this fails with `NotAllItemsReady`.
    pub fn ready_group_item(&mut self) -> CoreResult<()> {
        match self.status {
            GroupItemStatus::Ready => return Ok(()),
            GroupItemStatus::Pending | GroupItemStatus::Started => {}
            other => return Err(CoreError::invalid_transition("group item", other, "ready")),
        }
        if !self.all_items_ready() {
            return Err(CoreError::NotAllItemsReady);
        }
        self.status = GroupItemStatus::Ready;
        Ok(())
    }

    /// Anything not yet ready → CANCELLED.
    pub fn cancel_group_item(&mut self) -> CoreResult<()> {
        match self.status {
            GroupItemStatus::Staging | GroupItemStatus::Pending | GroupItemStatus::Started => {
                self.status = GroupItemStatus::Cancelled;
                Ok(())
            }
            other => Err(CoreError::invalid_transition("group item", other, "cancel")),
        }
    }

    /// Recomputes totals over the loaded item set, skipping cancelled items.
    pub fn calculate_total_values(&mut self) {
        let live = || self.items.iter().filter(|i| !i.is_cancelled());
        let price: Money = live().map(|i| i.total_price).sum();
        let cost: Money = live().map(|i| i.total_cost).sum();
        self.total_price = price;
        self.total_cost = cost;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
