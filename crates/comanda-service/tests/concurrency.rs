//! Racing writers against one order.

mod common;

use comanda_core::repository::{GroupItemRepository, ProductRepository};
use comanda_core::{CoreError, GroupItem};

use common::{add_request, Fixture};

const WRITERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_find_or_create_yields_one_open_group() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;
    let product = fx.store.get_product_by_id(&fx.ctx, fx.pizza.id).await.unwrap();

    let mut handles = Vec::with_capacity(WRITERS);
    for _ in 0..WRITERS {
        let store = fx.store.clone();
        let ctx = fx.ctx.clone();
        let candidate = GroupItem::new(order.id, &product).unwrap();
        handles.push(tokio::spawn(async move {
            store.find_or_create_open_group(&ctx, &candidate).await
        }));
    }

    let mut ids = Vec::with_capacity(WRITERS);
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let groups = fx.store.get_groups_by_order_id(&fx.ctx, order.id).await.unwrap();
    assert_eq!(groups.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_share_a_group() {
    let fx = Fixture::new().await;
    let order = fx.pickup_order().await;

    let mut handles = Vec::with_capacity(WRITERS);
    for _ in 0..WRITERS {
        let services = fx.services.clone();
        let ctx = fx.ctx.clone();
        let request = add_request(order.id, &fx.pizza, &fx.pizza_single);
        handles.push(tokio::spawn(async move {
            services.items.add_item_order(&ctx, request).await
        }));
    }

    let mut added = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => added.push(result),
            // The order row itself may lose a version race.
            Err(CoreError::Conflict { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(!added.is_empty());
    assert!(added
        .iter()
        .all(|a| a.group_item_id == added[0].group_item_id));

    let groups = fx.store.get_groups_by_order_id(&fx.ctx, order.id).await.unwrap();
    assert_eq!(groups.len(), 1);
}
