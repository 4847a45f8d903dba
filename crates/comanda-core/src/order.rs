//! # Order
//!
//! A customer transaction: the group items it owns, its payments and the
//! data specific to how it is served (pickup, delivery or table).
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────┐ pending ┌─────────┐ all groups ready ┌───────┐
//! │ STAGING │ ──────► │ PENDING │ ───────────────► │ READY │
//! └────┬────┘         └──┬───┬──┘                  └─┬───┬─┘
//!      │                 │   │ finish                │   │ finish
//!      │                 │   └──────────────┬────────┘   │
//!      │                 │ archive          ▼            │
//!      │                 ▼            ┌──────────┐       │
//!      │           ┌──────────┐       │ FINISHED │       │
//!      │           │ ARCHIVED │       └──────────┘       │
//!      │           └────┬─────┘ unarchive → PENDING      │
//!      │                                                 │
//!      └──────────── cancel (staging, pending, ready) ───┴──► CANCELLED
//! ```
//!
//! - Payments are accepted only while PENDING or READY.
//! - FINISHED requires every group to be READY or CANCELLED.
//! - Only ARCHIVED ↔ PENDING and PENDING ↔ READY move backwards.
//!
//! ## Order Kinds
//! ```text
//! Pickup    WAITING ──launch──► LAUNCHED ──pick up──► PICKED_UP
//! Delivery  WAITING ──launch(driver)──► SHIPPED ──finish──► DELIVERED
//! Table     OPEN ──close──► CLOSED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::group_item::{GroupItem, GroupItemStatus};
use crate::item::ItemStatus;
use crate::macros::text_enum;
use crate::money::Money;

// =============================================================================
// Statuses
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being assembled, not yet sent to the kitchen.
    #[default]
    Staging,
    /// Sent to the kitchen.
    Pending,
    /// Every group is ready or cancelled.
    Ready,
    Finished,
    Cancelled,
    /// Parked; can be brought back with unarchive.
    Archived,
}

text_enum!(OrderStatus, "order status" {
    Staging => "staging",
    Pending => "pending",
    Ready => "ready",
    Finished => "finished",
    Cancelled => "cancelled",
    Archived => "archived",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PickupStatus {
    #[default]
    Waiting,
    Launched,
    PickedUp,
}

text_enum!(PickupStatus, "pickup status" {
    Waiting => "waiting",
    Launched => "launched",
    PickedUp => "picked_up",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Waiting,
    Shipped,
    Delivered,
}

text_enum!(DeliveryStatus, "delivery status" {
    Waiting => "waiting",
    Shipped => "shipped",
    Delivered => "delivered",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Open,
    Closed,
}

text_enum!(TableStatus, "table status" {
    Open => "open",
    Closed => "closed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Credit,
    Debit,
    Pix,
    Voucher,
}

text_enum!(PaymentMethod, "payment method" {
    Cash => "cash",
    Credit => "credit",
    Debit => "debit",
    Pix => "pix",
    Voucher => "voucher",
});

// =============================================================================
// Order Kinds
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PickupOrder {
    /// Name called out at the counter.
    pub name: String,
    #[serde(default)]
    pub status: PickupStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryOrder {
    pub client_id: Uuid,
    pub address_id: Uuid,
    #[serde(default)]
    pub driver_id: Option<Uuid>,
    #[serde(default)]
    pub status: DeliveryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TableOrder {
    pub table_id: Uuid,
    #[serde(default)]
    pub waiter_id: Option<Uuid>,
    #[serde(default)]
    pub status: TableStatus,
}

/// How the order is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderKind {
    Pickup(PickupOrder),
    Delivery(DeliveryOrder),
    Table(TableOrder),
}

impl OrderKind {
    pub const fn name(&self) -> &'static str {
        match self {
            OrderKind::Pickup(_) => "pickup",
            OrderKind::Delivery(_) => "delivery",
            OrderKind::Table(_) => "table",
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentOrder {
    pub id: Uuid,
    pub order_id: Uuid,
    pub method: PaymentMethod,
    pub amount: Money,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

impl PaymentOrder {
    pub fn new(order_id: Uuid, method: PaymentMethod, amount: Money) -> Self {
        PaymentOrder {
            id: Uuid::new_v4(),
            order_id,
            method,
            amount,
            paid_at: Utc::now(),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: Uuid,
    pub status: OrderStatus,
    pub kind: OrderKind,
    pub groups: Vec<GroupItem>,
    pub payments: Vec<PaymentOrder>,
    /// Σ non-cancelled group totals.
    pub total_payable: Money,
    /// Σ payments.
    pub total_paid: Money,
    pub observation: Option<String>,
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub pending_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub finished_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Creates an empty STAGING order.
    pub fn new(kind: OrderKind) -> Self {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            status: OrderStatus::Staging,
            kind,
            groups: Vec::new(),
            payments: Vec::new(),
            total_payable: Money::zero(),
            total_paid: Money::zero(),
            observation: None,
            version: 0,
            created_at: now,
            updated_at: now,
            pending_at: None,
            finished_at: None,
            cancelled_at: None,
            archived_at: None,
        }
    }

    /// Orders that still accept items: staging, pending or ready.
    pub fn can_add_items(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Staging | OrderStatus::Pending | OrderStatus::Ready
        )
    }

    /// Fails with `OrderClosed` unless items can still be added.
    pub fn ensure_open(&self) -> CoreResult<()> {
        if self.can_add_items() {
            Ok(())
        } else {
            Err(CoreError::OrderClosed(self.id.to_string()))
        }
    }

    /// True when the loaded groups are all ready or cancelled and at least
    /// one of them is ready.
    pub fn all_groups_ready(&self) -> bool {
        self.groups.iter().all(GroupItem::is_settled)
            && self.groups.iter().any(|g| g.status == GroupItemStatus::Ready)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// STAGING → PENDING. Staging groups are sent along with it.
    pub fn pending_order(&mut self) -> CoreResult<()> {
        if self.status != OrderStatus::Staging {
            return Err(CoreError::invalid_transition("order", self.status, "send"));
        }
        if !self
            .groups
            .iter()
            .any(|g| g.status != GroupItemStatus::Cancelled)
        {
            return Err(CoreError::OrderWithoutItems);
        }

        for group in self
            .groups
            .iter_mut()
            .filter(|g| g.status == GroupItemStatus::Staging)
        {
            group.pending_group_item()?;
        }

        self.status = OrderStatus::Pending;
        self.pending_at = Some(Utc::now());
        Ok(())
    }

    /// PENDING → READY once every group is settled.
    pub fn ready_order(&mut self) -> CoreResult<()> {
        match self.status {
            OrderStatus::Ready => return Ok(()),
            OrderStatus::Pending => {}
            other => return Err(CoreError::invalid_transition("order", other, "ready")),
        }
        if !self.all_groups_ready() {
            return Err(CoreError::NotAllGroupsReady);
        }
        self.status = OrderStatus::Ready;
        Ok(())
    }

    /// READY → PENDING, used when new items arrive after the kitchen
    /// finished the previous round.
    pub fn reopen_order(&mut self) -> CoreResult<()> {
        match self.status {
            OrderStatus::Ready => {
                self.status = OrderStatus::Pending;
                Ok(())
            }
            OrderStatus::Staging | OrderStatus::Pending => Ok(()),
            other => Err(CoreError::invalid_transition("order", other, "reopen")),
        }
    }

    /// PENDING | READY → FINISHED.
    pub fn finish_order(&mut self) -> CoreResult<()> {
        if !matches!(self.status, OrderStatus::Pending | OrderStatus::Ready) {
            return Err(CoreError::invalid_transition("order", self.status, "finish"));
        }
        if !self.groups.iter().all(GroupItem::is_settled) {
            return Err(CoreError::NotAllGroupsReady);
        }
        self.status = OrderStatus::Finished;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// STAGING | PENDING | READY → CANCELLED.
    ///
    /// Every group that is not ready is cancelled too, along with its
    /// pending and started items. Groups must be loaded with items for the
    /// item cascade to happen.
    pub fn cancel_order(&mut self) -> CoreResult<()> {
        if !self.can_add_items() {
            return Err(CoreError::invalid_transition("order", self.status, "cancel"));
        }

        for group in self.groups.iter_mut().filter(|g| !g.is_settled()) {
            group.cancel_group_item()?;
            for item in group
                .items
                .iter_mut()
                .filter(|i| matches!(i.status, ItemStatus::Pending | ItemStatus::Started))
            {
                item.cancel_item()?;
            }
            group.calculate_total_values();
        }

        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(Utc::now());
        self.calculate_total();
        Ok(())
    }

    /// PENDING | READY → ARCHIVED.
    pub fn archive_order(&mut self) -> CoreResult<()> {
        if !matches!(self.status, OrderStatus::Pending | OrderStatus::Ready) {
            return Err(CoreError::invalid_transition("order", self.status, "archive"));
        }
        self.status = OrderStatus::Archived;
        self.archived_at = Some(Utc::now());
        Ok(())
    }

    /// ARCHIVED → PENDING.
    pub fn unarchive_order(&mut self) -> CoreResult<()> {
        if self.status != OrderStatus::Archived {
            return Err(CoreError::invalid_transition("order", self.status, "unarchive"));
        }
        self.status = OrderStatus::Pending;
        self.archived_at = None;
        Ok(())
    }

    /// Records a payment. Pending and ready orders take payments.
    pub fn add_payment(&mut self, payment: PaymentOrder) -> CoreResult<()> {
        if !matches!(self.status, OrderStatus::Pending | OrderStatus::Ready) {
            return Err(CoreError::OrderMustBePending);
        }
        if !payment.amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }
        self.payments.push(payment);
        self.calculate_total();
        Ok(())
    }

    pub fn set_observation(&mut self, observation: Option<String>) {
        self.observation = observation.filter(|o| !o.trim().is_empty());
    }

    /// Recomputes payable and paid totals from the loaded groups and
    /// payments.
    pub fn calculate_total(&mut self) {
        self.total_payable = self
            .groups
            .iter()
            .filter(|g| g.status != GroupItemStatus::Cancelled)
            .map(|g| g.total_price)
            .sum();
        self.total_paid = self.payments.iter().map(|p| p.amount).sum();
    }

    /// What is still owed. Negative when overpaid.
    pub fn balance(&self) -> Money {
        self.total_payable - self.total_paid
    }

    // =========================================================================
    // Kind Transitions
    // =========================================================================

    fn ensure_dispatchable(&self, action: &'static str) -> CoreResult<()> {
        if matches!(self.status, OrderStatus::Pending | OrderStatus::Ready) {
            Ok(())
        } else {
            Err(CoreError::invalid_transition("order", self.status, action))
        }
    }

    fn pickup_mut(&mut self) -> CoreResult<&mut PickupOrder> {
        match &mut self.kind {
            OrderKind::Pickup(p) => Ok(p),
            other => Err(CoreError::WrongOrderKind {
                expected: "pickup",
                actual: other.name(),
            }),
        }
    }

    fn delivery_mut(&mut self) -> CoreResult<&mut DeliveryOrder> {
        match &mut self.kind {
            OrderKind::Delivery(d) => Ok(d),
            other => Err(CoreError::WrongOrderKind {
                expected: "delivery",
                actual: other.name(),
            }),
        }
    }

    fn table_mut(&mut self) -> CoreResult<&mut TableOrder> {
        match &mut self.kind {
            OrderKind::Table(t) => Ok(t),
            other => Err(CoreError::WrongOrderKind {
                expected: "table",
                actual: other.name(),
            }),
        }
    }

    /// Pickup: WAITING → LAUNCHED (order is on the counter).
    pub fn launch_pickup(&mut self) -> CoreResult<()> {
        self.ensure_dispatchable("launch")?;
        let pickup = self.pickup_mut()?;
        if pickup.status != PickupStatus::Waiting {
            return Err(CoreError::invalid_transition("pickup", pickup.status, "launch"));
        }
        pickup.status = PickupStatus::Launched;
        Ok(())
    }

    /// Pickup: LAUNCHED → PICKED_UP.
    pub fn pick_up(&mut self) -> CoreResult<()> {
        self.ensure_dispatchable("pick up")?;
        let pickup = self.pickup_mut()?;
        if pickup.status != PickupStatus::Launched {
            return Err(CoreError::invalid_transition("pickup", pickup.status, "pick up"));
        }
        pickup.status = PickupStatus::PickedUp;
        Ok(())
    }

    /// Delivery: WAITING → SHIPPED with the given driver.
    pub fn launch_delivery(&mut self, driver_id: Uuid) -> CoreResult<()> {
        self.ensure_dispatchable("ship")?;
        let delivery = self.delivery_mut()?;
        if delivery.status != DeliveryStatus::Waiting {
            return Err(CoreError::invalid_transition("delivery", delivery.status, "ship"));
        }
        delivery.driver_id = Some(driver_id);
        delivery.status = DeliveryStatus::Shipped;
        Ok(())
    }

    /// Delivery: SHIPPED → DELIVERED.
    pub fn finish_delivery(&mut self) -> CoreResult<()> {
        self.ensure_dispatchable("deliver")?;
        let delivery = self.delivery_mut()?;
        if delivery.status != DeliveryStatus::Shipped {
            return Err(CoreError::invalid_transition("delivery", delivery.status, "deliver"));
        }
        delivery.status = DeliveryStatus::Delivered;
        Ok(())
    }

    /// Reassigns the driver of a delivery that has not arrived yet.
    pub fn update_delivery_driver(&mut self, driver_id: Uuid) -> CoreResult<()> {
        self.ensure_dispatchable("reassign driver of")?;
        let delivery = self.delivery_mut()?;
        if delivery.status == DeliveryStatus::Delivered {
            return Err(CoreError::invalid_transition(
                "delivery",
                delivery.status,
                "reassign driver of",
            ));
        }
        delivery.driver_id = Some(driver_id);
        Ok(())
    }

    /// Table: OPEN → CLOSED. Also allowed after the order is finished.
    pub fn close_table(&mut self) -> CoreResult<()> {
        if !matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::Ready | OrderStatus::Finished
        ) {
            return Err(CoreError::invalid_transition("order", self.status, "close table of"));
        }
        let table = self.table_mut()?;
        if table.status != TableStatus::Open {
            return Err(CoreError::invalid_transition("table", table.status, "close"));
        }
        table.status = TableStatus::Closed;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::tests::pizza;
    use crate::item::Item;

    fn pickup() -> OrderKind {
        OrderKind::Pickup(PickupOrder {
            name: "Ana".into(),
            status: PickupStatus::Waiting,
        })
    }

    fn order_with_group(item_status: ItemStatus) -> Order {
        let mut order = Order::new(pickup());
        let (product, quantity) = pizza(1000);
        let mut group = GroupItem::new(order.id, &product).unwrap();
        let mut item = Item::from_product(group.id, &product, &quantity).unwrap();
        item.status = item_status;
        group.items.push(item);
        group.calculate_total_values();
        order.groups.push(group);
        order.calculate_total();
        order
    }

    #[test]
    fn test_pending_requires_groups() {
        let mut order = Order::new(pickup());
        assert!(matches!(order.pending_order(), Err(CoreError::OrderWithoutItems)));
        assert_eq!(order.status, OrderStatus::Staging);
    }

    #[test]
    fn test_pending_sends_staging_groups() {
        let mut order = order_with_group(ItemStatus::Pending);
        order.pending_order().unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.pending_at.is_some());
        assert_eq!(order.groups[0].status, GroupItemStatus::Pending);
        assert!(order.pending_order().is_err());
    }

    #[test]
    fn test_totals_follow_groups_and_payments() {
        let mut order = order_with_group(ItemStatus::Pending);
        assert_eq!(order.total_payable.cents(), 2000);

        order.pending_order().unwrap();
        order
            .add_payment(PaymentOrder::new(order.id, PaymentMethod::Pix, Money::from_cents(1500)))
            .unwrap();
        assert_eq!(order.total_paid.cents(), 1500);
        assert_eq!(order.balance().cents(), 500);
    }

    #[test]
    fn test_payment_only_while_pending() {
        let mut order = order_with_group(ItemStatus::Pending);
        let payment = PaymentOrder::new(order.id, PaymentMethod::Cash, Money::from_cents(100));
        assert!(matches!(
            order.add_payment(payment.clone()),
            Err(CoreError::OrderMustBePending)
        ));

        order.pending_order().unwrap();
        let zero = PaymentOrder::new(order.id, PaymentMethod::Cash, Money::zero());
        assert!(matches!(order.add_payment(zero), Err(CoreError::Validation(_))));
        order.add_payment(payment).unwrap();
    }

    #[test]
    fn test_ready_order_takes_payments() {
        let mut order = order_with_group(ItemStatus::Ready);
        order.pending_order().unwrap();
        order.groups[0].ready_group_item().unwrap();
        order.ready_order().unwrap();

        let payment = PaymentOrder::new(order.id, PaymentMethod::Credit, Money::from_cents(700));
        order.add_payment(payment).unwrap();
        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(order.total_paid.cents(), 700);

        order.finish_order().unwrap();
        let late = PaymentOrder::new(order.id, PaymentMethod::Credit, Money::from_cents(100));
        assert!(matches!(order.add_payment(late), Err(CoreError::OrderMustBePending)));
    }

    #[test]
    fn test_finish_requires_settled_groups() {
        let mut order = order_with_group(ItemStatus::Started);
        order.pending_order().unwrap();
        order.groups[0].start_group_item().unwrap();
        assert!(matches!(order.finish_order(), Err(CoreError::NotAllGroupsReady)));

        order.groups[0].items[0].ready_item().unwrap();
        order.groups[0].ready_group_item().unwrap();
        order.ready_order().unwrap();
        order.finish_order().unwrap();
        assert_eq!(order.status, OrderStatus::Finished);
        assert!(order.cancel_order().is_err());
    }

    #[test]
    fn test_cancel_cascades_to_open_groups() {
        let mut order = order_with_group(ItemStatus::Started);
        order.pending_order().unwrap();
        order.cancel_order().unwrap();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.groups[0].status, GroupItemStatus::Cancelled);
        assert_eq!(order.groups[0].items[0].status, ItemStatus::Cancelled);
        assert!(order.total_payable.is_zero());
    }

    #[test]
    fn test_archive_round_trip() {
        let mut order = order_with_group(ItemStatus::Pending);
        assert!(order.archive_order().is_err());

        order.pending_order().unwrap();
        order.archive_order().unwrap();
        assert_eq!(order.status, OrderStatus::Archived);
        assert!(!order.can_add_items());

        order.unarchive_order().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.archived_at.is_none());
    }

    #[test]
    fn test_pickup_flow_and_wrong_kind() {
        let mut order = order_with_group(ItemStatus::Pending);
        order.pending_order().unwrap();

        assert!(matches!(
            order.launch_delivery(Uuid::new_v4()),
            Err(CoreError::WrongOrderKind { expected: "delivery", actual: "pickup" })
        ));
        assert!(order.pick_up().is_err());
        order.launch_pickup().unwrap();
        order.pick_up().unwrap();
        assert!(matches!(
            order.kind,
            OrderKind::Pickup(PickupOrder { status: PickupStatus::PickedUp, .. })
        ));
    }

    #[test]
    fn test_delivery_flow() {
        let mut order = Order::new(OrderKind::Delivery(DeliveryOrder {
            client_id: Uuid::new_v4(),
            address_id: Uuid::new_v4(),
            driver_id: None,
            status: DeliveryStatus::Waiting,
        }));
        order.status = OrderStatus::Ready;

        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        order.launch_delivery(first).unwrap();
        order.update_delivery_driver(second).unwrap();
        order.finish_delivery().unwrap();
        assert!(order.update_delivery_driver(first).is_err());

        match &order.kind {
            OrderKind::Delivery(d) => {
                assert_eq!(d.driver_id, Some(second));
                assert_eq!(d.status, DeliveryStatus::Delivered);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_close_table_after_finish() {
        let mut order = Order::new(OrderKind::Table(TableOrder {
            table_id: Uuid::new_v4(),
            waiter_id: None,
            status: TableStatus::Open,
        }));
        assert!(order.close_table().is_err());

        order.status = OrderStatus::Finished;
        order.close_table().unwrap();
        assert!(order.close_table().is_err());
    }

    #[test]
    fn test_kind_serializes_with_type_tag() {
        let json = serde_json::to_value(pickup()).unwrap();
        assert_eq!(json["type"], "pickup");
        assert_eq!(json["name"], "Ana");
        assert_eq!(json["status"], "waiting");

        let back: OrderKind =
            serde_json::from_value(serde_json::json!({ "type": "pickup", "name": "Bia" })).unwrap();
        assert_eq!(back.name(), "pickup");
    }
}
