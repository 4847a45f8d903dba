//! Order lifecycle, payments and kind-specific transitions.

mod common;

use uuid::Uuid;

use comanda_core::{
    CoreError, DeliveryOrder, DeliveryStatus, GroupItemStatus, ItemStatus, Money, Order,
    OrderKind, OrderStatus, PaymentMethod, PickupOrder, PickupStatus, TableOrder, TableStatus,
    ValidationError,
};
use comanda_service::{AddPaymentRequest, CreateOrderRequest};

use common::Fixture;

async fn create(fx: &Fixture, kind: OrderKind) -> Order {
    fx.services
        .orders
        .create_order(&fx.ctx, CreateOrderRequest { kind, observation: None })
        .await
        .unwrap()
}

fn delivery() -> OrderKind {
    OrderKind::Delivery(DeliveryOrder {
        client_id: Uuid::new_v4(),
        address_id: Uuid::new_v4(),
        driver_id: None,
        status: DeliveryStatus::default(),
    })
}

fn table() -> OrderKind {
    OrderKind::Table(TableOrder {
        table_id: Uuid::new_v4(),
        waiter_id: None,
        status: TableStatus::default(),
    })
}

/// A pending pickup order holding one 10.00 pizza.
async fn pending_with_pizza(fx: &Fixture) -> Order {
    let order = fx.pickup_order().await;
    fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap()
}

fn pay(cents: i64) -> AddPaymentRequest {
    AddPaymentRequest {
        method: PaymentMethod::Cash,
        amount: Money::from_cents(cents),
    }
}

// =============================================================================
// Creation
// =============================================================================

#[tokio::test]
async fn test_create_order_starts_staging() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    assert_eq!(order.status, OrderStatus::Staging);
    assert!(order.groups.is_empty());
    assert!(order.total_payable.is_zero());

    let loaded = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(loaded.kind, order.kind);
}

#[tokio::test]
async fn test_create_pickup_requires_name() {
    let fx = Fixture::new().await;
    let result = fx
        .services
        .orders
        .create_order(
            &fx.ctx,
            CreateOrderRequest {
                kind: OrderKind::Pickup(PickupOrder {
                    name: "  ".to_string(),
                    status: PickupStatus::default(),
                }),
                observation: None,
            },
        )
        .await;

    assert!(matches!(
        result,
        Err(CoreError::Validation(ValidationError::Required { .. }))
    ));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_pending_requires_items() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    let result = fx.services.orders.pending_order(&fx.ctx, order.id).await;
    assert!(matches!(result, Err(CoreError::OrderWithoutItems)));
}

#[tokio::test]
async fn test_pending_sends_staging_groups() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let pizza = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let drink = fx.add(order.id, &fx.drink, &fx.drink_single).await;

    let order = fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_payable, Money::from_cents(1500));

    for group_id in [pizza.group_item_id, drink.group_item_id] {
        let group = fx.services.groups.get_group(&fx.ctx, group_id).await.unwrap();
        assert_eq!(group.status, GroupItemStatus::Pending);
    }

    let again = fx.services.orders.pending_order(&fx.ctx, order.id).await;
    assert!(matches!(again, Err(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_cancel_cascades_to_unfinished_groups_and_items() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let pizza = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let drink = fx.add(order.id, &fx.drink, &fx.drink_single).await;
    fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap();

    // The drink is served before the order is cancelled.
    fx.services.items.start_item(&fx.ctx, drink.item_id).await.unwrap();
    fx.services.items.ready_item(&fx.ctx, drink.item_id).await.unwrap();

    let cancelled = fx.services.orders.cancel_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());

    let pizza_group = fx.services.groups.get_group(&fx.ctx, pizza.group_item_id).await.unwrap();
    assert_eq!(pizza_group.status, GroupItemStatus::Cancelled);
    assert_eq!(pizza_group.items[0].status, ItemStatus::Cancelled);

    let drink_group = fx.services.groups.get_group(&fx.ctx, drink.group_item_id).await.unwrap();
    assert_eq!(drink_group.status, GroupItemStatus::Ready);
    assert_eq!(drink_group.items[0].status, ItemStatus::Ready);

    let again = fx.services.orders.cancel_order(&fx.ctx, order.id).await;
    assert!(matches!(again, Err(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_finish_requires_settled_groups() {
    let fx = Fixture::new().await;
    let order = pending_with_pizza(&fx).await;

    let early = fx.services.orders.finish_order(&fx.ctx, order.id).await;
    assert!(matches!(early, Err(CoreError::NotAllGroupsReady)));

    let item_id = order.groups[0].items[0].id;
    fx.services.items.start_item(&fx.ctx, item_id).await.unwrap();
    fx.services.items.ready_item(&fx.ctx, item_id).await.unwrap();

    let ready = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(ready.status, OrderStatus::Ready);

    let finished = fx.services.orders.finish_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(finished.status, OrderStatus::Finished);
    assert!(finished.finished_at.is_some());
}

#[tokio::test]
async fn test_archive_and_unarchive() {
    let fx = Fixture::new().await;
    let staging = fx.pickup_order().await;
    let result = fx.services.orders.archive_order(&fx.ctx, staging.id).await;
    assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));

    let order = pending_with_pizza(&fx).await;
    let archived = fx.services.orders.archive_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(archived.status, OrderStatus::Archived);

    let listed = fx
        .services
        .orders
        .orders_by_status(&fx.ctx, &[OrderStatus::Archived])
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, order.id);

    let restored = fx.services.orders.unarchive_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(restored.status, OrderStatus::Pending);
    assert!(restored.archived_at.is_none());
}

#[tokio::test]
async fn test_unarchive_restores_ready_order() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap();
    fx.services.items.start_item(&fx.ctx, added.item_id).await.unwrap();
    fx.services.items.ready_item(&fx.ctx, added.item_id).await.unwrap();

    let archived = fx.services.orders.archive_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(archived.status, OrderStatus::Archived);

    let restored = fx.services.orders.unarchive_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(restored.status, OrderStatus::Ready);
    assert!(restored.archived_at.is_none());

    let loaded = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(loaded.status, OrderStatus::Ready);
}

#[tokio::test]
async fn test_observation_blank_is_cleared() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    let updated = fx
        .services
        .orders
        .update_observation(&fx.ctx, order.id, Some("extra napkins".to_string()))
        .await
        .unwrap();
    assert_eq!(updated.observation.as_deref(), Some("extra napkins"));

    let cleared = fx
        .services
        .orders
        .update_observation(&fx.ctx, order.id, Some("   ".to_string()))
        .await
        .unwrap();
    assert!(cleared.observation.is_none());
}

// =============================================================================
// Payments
// =============================================================================

#[tokio::test]
async fn test_payments_accumulate_on_pending_orders() {
    let fx = Fixture::new().await;
    let order = pending_with_pizza(&fx).await;

    let order = fx.services.orders.add_payment(&fx.ctx, order.id, pay(400)).await.unwrap();
    assert_eq!(order.total_paid, Money::from_cents(400));
    assert_eq!(order.balance(), Money::from_cents(600));

    let order = fx.services.orders.add_payment(&fx.ctx, order.id, pay(600)).await.unwrap();
    assert_eq!(order.payments.len(), 2);
    assert!(order.balance().is_zero());

    let loaded = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(loaded.total_paid, Money::from_cents(1000));
    assert_eq!(loaded.payments.len(), 2);
}

#[tokio::test]
async fn test_fully_prepared_order_takes_payment() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap();
    fx.services.items.start_item(&fx.ctx, added.item_id).await.unwrap();
    fx.services.items.ready_item(&fx.ctx, added.item_id).await.unwrap();

    let ready = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(ready.status, OrderStatus::Ready);

    let paid = fx.services.orders.add_payment(&fx.ctx, order.id, pay(1000)).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Ready);
    assert!(paid.balance().is_zero());

    let finished = fx.services.orders.finish_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(finished.status, OrderStatus::Finished);
    assert_eq!(finished.total_paid, Money::from_cents(1000));

    let result = fx.services.orders.add_payment(&fx.ctx, order.id, pay(100)).await;
    assert!(matches!(result, Err(CoreError::OrderMustBePending)));
}

#[tokio::test]
async fn test_payment_rejected_outside_pending() {
    let fx = Fixture::new().await;
    let staging = fx.pickup_order().await;

    let result = fx.services.orders.add_payment(&fx.ctx, staging.id, pay(100)).await;
    assert!(matches!(result, Err(CoreError::OrderMustBePending)));
}

#[tokio::test]
async fn test_payment_must_be_positive() {
    let fx = Fixture::new().await;
    let order = pending_with_pizza(&fx).await;

    let result = fx.services.orders.add_payment(&fx.ctx, order.id, pay(0)).await;
    assert!(matches!(
        result,
        Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
    ));
}

// =============================================================================
// Kinds
// =============================================================================

#[tokio::test]
async fn test_pickup_flow() {
    let fx = Fixture::new().await;
    let order = pending_with_pizza(&fx).await;

    let early = fx.services.orders.pick_up(&fx.ctx, order.id).await;
    assert!(matches!(early, Err(CoreError::InvalidTransition { .. })));

    fx.services.orders.launch_pickup(&fx.ctx, order.id).await.unwrap();
    let order = fx.services.orders.pick_up(&fx.ctx, order.id).await.unwrap();

    match order.kind {
        OrderKind::Pickup(pickup) => assert_eq!(pickup.status, PickupStatus::PickedUp),
        other => panic!("unexpected kind {other:?}"),
    }
}

#[tokio::test]
async fn test_delivery_flow_and_driver_changes() {
    let fx = Fixture::new().await;
    let order = create(&fx, delivery()).await;
    fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap();

    let first_driver = Uuid::new_v4();
    let second_driver = Uuid::new_v4();

    fx.services
        .orders
        .launch_delivery(&fx.ctx, order.id, first_driver)
        .await
        .unwrap();
    fx.services
        .orders
        .update_delivery_driver(&fx.ctx, order.id, second_driver)
        .await
        .unwrap();
    let order = fx.services.orders.finish_delivery(&fx.ctx, order.id).await.unwrap();

    match &order.kind {
        OrderKind::Delivery(delivery) => {
            assert_eq!(delivery.status, DeliveryStatus::Delivered);
            assert_eq!(delivery.driver_id, Some(second_driver));
        }
        other => panic!("unexpected kind {other:?}"),
    }

    let late = fx
        .services
        .orders
        .update_delivery_driver(&fx.ctx, order.id, first_driver)
        .await;
    assert!(matches!(late, Err(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_table_close_and_wrong_kind() {
    let fx = Fixture::new().await;
    let order = create(&fx, table()).await;
    fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap();

    let wrong = fx.services.orders.launch_pickup(&fx.ctx, order.id).await;
    assert!(matches!(
        wrong,
        Err(CoreError::WrongOrderKind {
            expected: "pickup",
            actual: "table"
        })
    ));

    let order = fx.services.orders.close_table(&fx.ctx, order.id).await.unwrap();
    match order.kind {
        OrderKind::Table(table) => assert_eq!(table.status, TableStatus::Closed),
        other => panic!("unexpected kind {other:?}"),
    }
}
