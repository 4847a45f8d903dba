//! Item → group → order cascades, driven through the services.

mod common;

use comanda_core::repository::GroupItemRepository;
use comanda_core::{CoreError, GroupItemStatus, ItemStatus, Money, OrderStatus, RequestContext};
use comanda_service::{AddAdditionalRequest, AddItemRequest, UpdateQuantityRequest};

use common::{add_request, Fixture};

// =============================================================================
// Adding items
// =============================================================================

#[tokio::test]
async fn test_add_item_creates_staging_group_with_totals() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_double).await;

    let group = fx.services.groups.get_group(&fx.ctx, added.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Staging);
    assert_eq!(group.items.len(), 1);
    assert_eq!(group.items[0].total_price, Money::from_cents(2000));
    assert_eq!(group.total_price, Money::from_cents(2000));
    assert!(group.need_print);
    assert_eq!(group.size, "Large");

    let order = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(order.total_payable, Money::from_cents(2000));
}

#[tokio::test]
async fn test_second_add_reuses_open_group() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    let first = fx.add(order.id, &fx.pizza, &fx.pizza_double).await;
    let second = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    assert_eq!(first.group_item_id, second.group_item_id);
    assert_ne!(first.item_id, second.item_id);

    let group = fx.services.groups.get_group(&fx.ctx, first.group_item_id).await.unwrap();
    assert_eq!(group.items.len(), 2);
    assert_eq!(group.total_price, Money::from_cents(3000));
}

#[tokio::test]
async fn test_categories_get_separate_groups() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    let pizza = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let drink = fx.add(order.id, &fx.drink, &fx.drink_single).await;
    assert_ne!(pizza.group_item_id, drink.group_item_id);

    let order = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(order.groups.len(), 2);
    assert_eq!(order.total_payable, Money::from_cents(1500));
}

#[tokio::test]
async fn test_started_group_is_not_reused() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    let first = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.items.start_item(&fx.ctx, first.item_id).await.unwrap();

    let second = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    assert_ne!(first.group_item_id, second.group_item_id);

    let explicit = AddItemRequest {
        group_item_id: Some(first.group_item_id),
        ..add_request(order.id, &fx.pizza, &fx.pizza_single)
    };
    let result = fx.services.items.add_item_order(&fx.ctx, explicit).await;
    assert!(matches!(result, Err(CoreError::GroupNotStaging)));
}

#[tokio::test]
async fn test_explicit_group_must_belong_to_order() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let other = fx.pickup_order().await;

    let added = fx.add(other.id, &fx.pizza, &fx.pizza_single).await;

    let request = AddItemRequest {
        group_item_id: Some(added.group_item_id),
        ..add_request(order.id, &fx.pizza, &fx.pizza_single)
    };
    let result = fx.services.items.add_item_order(&fx.ctx, request).await;
    assert!(matches!(result, Err(CoreError::GroupNotInOrder { .. })));
}

#[tokio::test]
async fn test_add_rejects_missing_prerequisites() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    let result = fx
        .services
        .items
        .add_item_order(&fx.ctx, add_request(order.id, &fx.sizeless, &fx.pizza_single))
        .await;
    assert!(matches!(result, Err(CoreError::SizeNotFound)));

    let result = fx
        .services
        .items
        .add_item_order(&fx.ctx, add_request(order.id, &fx.pizza, &fx.drink_single))
        .await;
    assert!(matches!(result, Err(CoreError::QuantityNotInCategory { .. })));

    let result = fx
        .services
        .items
        .add_item_order(&fx.ctx, add_request(uuid::Uuid::new_v4(), &fx.pizza, &fx.pizza_single))
        .await;
    assert!(matches!(result, Err(CoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_add_to_closed_order_fails() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.orders.cancel_order(&fx.ctx, order.id).await.unwrap();

    let result = fx
        .services
        .items
        .add_item_order(&fx.ctx, add_request(order.id, &fx.pizza, &fx.pizza_single))
        .await;
    assert!(matches!(result, Err(CoreError::OrderClosed(_))));
}

#[tokio::test]
async fn test_requires_tenant() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    let result = fx
        .services
        .items
        .add_item_order(
            &RequestContext::anonymous(),
            add_request(order.id, &fx.pizza, &fx.pizza_single),
        )
        .await;
    assert!(matches!(result, Err(CoreError::SchemaNotSet)));
}

// =============================================================================
// Kitchen progress
// =============================================================================

#[tokio::test]
async fn test_start_then_ready_walks_group_to_ready() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_double).await;

    let item = fx.services.items.start_item(&fx.ctx, added.item_id).await.unwrap();
    assert_eq!(item.status, ItemStatus::Started);
    let group = fx.services.groups.get_group(&fx.ctx, added.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Started);

    let item = fx.services.items.ready_item(&fx.ctx, added.item_id).await.unwrap();
    assert_eq!(item.status, ItemStatus::Ready);
    let group = fx.services.groups.get_group(&fx.ctx, added.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Ready);
}

#[tokio::test]
async fn test_start_and_ready_only_from_expected_status() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    let early = fx.services.items.ready_item(&fx.ctx, added.item_id).await;
    assert!(matches!(early, Err(CoreError::InvalidTransition { .. })));

    fx.services.items.start_item(&fx.ctx, added.item_id).await.unwrap();
    let again = fx.services.items.start_item(&fx.ctx, added.item_id).await;
    assert!(matches!(again, Err(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_partial_readiness_keeps_group_started() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let first = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let second = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    fx.services.items.start_item(&fx.ctx, first.item_id).await.unwrap();
    fx.services.items.start_item(&fx.ctx, second.item_id).await.unwrap();

    let ready = fx.services.items.ready_item(&fx.ctx, first.item_id).await;
    assert!(ready.is_ok());

    let group = fx.services.groups.get_group(&fx.ctx, first.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Started);
}

#[tokio::test]
async fn test_last_ready_group_readies_pending_order() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let pizza = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let drink = fx.add(order.id, &fx.drink, &fx.drink_single).await;
    fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap();

    for added in [pizza, drink] {
        fx.services.items.start_item(&fx.ctx, added.item_id).await.unwrap();
    }

    fx.services.items.ready_item(&fx.ctx, pizza.item_id).await.unwrap();
    let current = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Pending);

    fx.services.items.ready_item(&fx.ctx, drink.item_id).await.unwrap();
    let current = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Ready);

    // New items reopen the order.
    fx.add(order.id, &fx.drink, &fx.drink_single).await;
    let current = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(current.status, OrderStatus::Pending);
}

// =============================================================================
// Cancelling and deleting
// =============================================================================

#[tokio::test]
async fn test_cancel_item_excludes_it_from_totals() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let first = fx.add(order.id, &fx.pizza, &fx.pizza_double).await;
    fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    fx.services.items.cancel_item(&fx.ctx, first.item_id).await.unwrap();

    let group = fx.services.groups.get_group(&fx.ctx, first.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Staging);
    assert_eq!(group.total_price, Money::from_cents(1000));

    let order = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(order.total_payable, Money::from_cents(1000));
}

#[tokio::test]
async fn test_cancelling_every_item_cancels_group() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    fx.services.items.cancel_item(&fx.ctx, added.item_id).await.unwrap();

    let group = fx.services.groups.get_group(&fx.ctx, added.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Cancelled);
    assert!(group.total_price.is_zero());

    let again = fx.services.items.cancel_item(&fx.ctx, added.item_id).await;
    assert!(matches!(again, Err(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_cancelling_the_last_unready_item_readies_group() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let first = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let second = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    fx.services.items.start_item(&fx.ctx, first.item_id).await.unwrap();
    fx.services.items.ready_item(&fx.ctx, first.item_id).await.unwrap();
    fx.services.items.cancel_item(&fx.ctx, second.item_id).await.unwrap();

    let group = fx.services.groups.get_group(&fx.ctx, first.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Ready);
}

#[tokio::test]
async fn test_deleting_last_item_removes_group() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_double).await;

    fx.services.items.delete_item_order(&fx.ctx, added.item_id).await.unwrap();

    let group = fx.store.get_group_by_id(&fx.ctx, added.group_item_id, false).await;
    assert!(matches!(group, Err(CoreError::NotFound { .. })));

    let order = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert!(order.groups.is_empty());
    assert!(order.total_payable.is_zero());
}

#[tokio::test]
async fn test_deleting_one_item_keeps_group_and_recomputes() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let first = fx.add(order.id, &fx.pizza, &fx.pizza_double).await;
    fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    fx.services.items.delete_item_order(&fx.ctx, first.item_id).await.unwrap();

    let group = fx.services.groups.get_group(&fx.ctx, first.group_item_id).await.unwrap();
    assert_eq!(group.items.len(), 1);
    assert_eq!(group.total_price, Money::from_cents(1000));
}

#[tokio::test]
async fn test_deleting_the_last_unready_item_readies_group_and_order() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let first = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let second = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.orders.pending_order(&fx.ctx, order.id).await.unwrap();

    fx.services.items.start_item(&fx.ctx, first.item_id).await.unwrap();
    fx.services.items.ready_item(&fx.ctx, first.item_id).await.unwrap();
    fx.services.items.delete_item_order(&fx.ctx, second.item_id).await.unwrap();

    let group = fx.services.groups.get_group(&fx.ctx, first.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Ready);
    assert_eq!(group.total_price, Money::from_cents(1000));

    let order = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Ready);

    let finished = fx.services.orders.finish_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(finished.status, OrderStatus::Finished);
}

#[tokio::test]
async fn test_deleting_the_last_live_item_cancels_group() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let first = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let second = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    fx.services.items.cancel_item(&fx.ctx, first.item_id).await.unwrap();
    fx.services.items.delete_item_order(&fx.ctx, second.item_id).await.unwrap();

    let group = fx.services.groups.get_group(&fx.ctx, first.group_item_id).await.unwrap();
    assert_eq!(group.status, GroupItemStatus::Cancelled);
    assert!(group.total_price.is_zero());
}

// =============================================================================
// Edits
// =============================================================================

#[tokio::test]
async fn test_quantity_change_recomputes_item_group_and_order() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let first = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    let dropped = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.items.cancel_item(&fx.ctx, dropped.item_id).await.unwrap();

    let item = fx
        .services
        .items
        .update_item_quantity(
            &fx.ctx,
            first.item_id,
            UpdateQuantityRequest {
                quantity_id: fx.pizza_double.id,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity_id, fx.pizza_double.id);
    assert_eq!(item.total_price, Money::from_cents(2000));

    let group = fx.services.groups.get_group(&fx.ctx, first.group_item_id).await.unwrap();
    let live: Money = group
        .items
        .iter()
        .filter(|i| i.status != ItemStatus::Cancelled)
        .map(|i| i.total_price)
        .sum();
    assert_eq!(group.total_price, live);
    assert_eq!(group.total_price, Money::from_cents(3000));

    let order = fx.services.orders.get_order(&fx.ctx, order.id).await.unwrap();
    assert_eq!(order.total_payable, Money::from_cents(3000));
}

#[tokio::test]
async fn test_quantity_change_is_checked() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    let wrong_category = UpdateQuantityRequest {
        quantity_id: fx.drink_single.id,
    };
    let result = fx
        .services
        .items
        .update_item_quantity(&fx.ctx, added.item_id, wrong_category)
        .await;
    assert!(matches!(result, Err(CoreError::QuantityNotInCategory { .. })));

    fx.services.items.start_item(&fx.ctx, added.item_id).await.unwrap();
    let double = UpdateQuantityRequest {
        quantity_id: fx.pizza_double.id,
    };
    let result = fx
        .services
        .items
        .update_item_quantity(&fx.ctx, added.item_id, double)
        .await;
    assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_additional_items_update_totals() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    let item = fx
        .services
        .items
        .add_additional_item(
            &fx.ctx,
            added.item_id,
            AddAdditionalRequest {
                product_id: fx.cheese.id,
                quantity_id: fx.cheese_single.id,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.additional_items.len(), 1);
    assert_eq!(item.total_price, Money::from_cents(1300));

    let group = fx.services.groups.get_group(&fx.ctx, added.group_item_id).await.unwrap();
    assert_eq!(group.total_price, Money::from_cents(1300));

    let additional_id = item.additional_items[0].id;
    let item = fx
        .services
        .items
        .remove_additional_item(&fx.ctx, added.item_id, additional_id)
        .await
        .unwrap();
    assert!(item.additional_items.is_empty());
    assert_eq!(item.total_price, Money::from_cents(1000));
}

#[tokio::test]
async fn test_started_item_cannot_be_edited() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;
    fx.services.items.start_item(&fx.ctx, added.item_id).await.unwrap();

    let result = fx
        .services
        .items
        .add_additional_item(
            &fx.ctx,
            added.item_id,
            AddAdditionalRequest {
                product_id: fx.cheese.id,
                quantity_id: fx.cheese_single.id,
            },
        )
        .await;
    assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn test_item_observation_is_validated() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let added = fx.add(order.id, &fx.pizza, &fx.pizza_single).await;

    let item = fx
        .services
        .items
        .update_item_observation(&fx.ctx, added.item_id, Some("no onions".to_string()))
        .await
        .unwrap();
    assert_eq!(item.observation.as_deref(), Some("no onions"));

    let too_long = "x".repeat(comanda_core::validation::MAX_OBSERVATION_LEN + 1);
    let result = fx
        .services
        .items
        .update_item_observation(&fx.ctx, added.item_id, Some(too_long))
        .await;
    assert!(matches!(result, Err(CoreError::Validation(_))));
}
