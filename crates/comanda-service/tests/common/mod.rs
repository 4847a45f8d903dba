//! Shared fixture: an in-memory tenant with a small menu.

#![allow(dead_code)]

use uuid::Uuid;

use comanda_core::{
    Category, Money, Multiplier, Order, OrderKind, PickupOrder, Product, Quantity, RequestContext,
    Size, TenantSchema,
};
use comanda_service::{
    AddItemRequest, CreateOrderRequest, ItemIdAndGroupItem, MemoryStore, Repositories, Services,
};

pub struct Fixture {
    pub store: MemoryStore,
    pub services: Services,
    pub ctx: RequestContext,
    /// Pizza at 10.00, with a 2-unit quantity.
    pub pizza: Product,
    pub pizza_double: Quantity,
    pub pizza_single: Quantity,
    /// Drink at 5.00 in its own category.
    pub drink: Product,
    pub drink_single: Quantity,
    /// Add-on at 3.00.
    pub cheese: Product,
    pub cheese_single: Quantity,
    /// A product whose size was never registered.
    pub sizeless: Product,
}

struct Section {
    category: Category,
    size: Size,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let ctx = RequestContext::for_tenant(TenantSchema::new("bistro").unwrap());

        let pizzas = section(&store, &ctx, "Pizzas", true, "Large").await;
        let drinks = section(&store, &ctx, "Drinks", false, "350ml").await;
        let extras = section(&store, &ctx, "Extras", false, "Portion").await;

        let pizza = product(&store, &ctx, &pizzas, "Margherita", 1000, true).await;
        let drink = product(&store, &ctx, &drinks, "Cola", 500, true).await;
        let cheese = product(&store, &ctx, &extras, "Extra Cheese", 300, true).await;

        let mut sizeless = Product {
            size_id: None,
            ..product_value(&pizzas, "Calzone", 1200, true)
        };
        sizeless.code = "SIZELESS".to_string();
        store.insert_product(&ctx, sizeless.clone()).await.unwrap();

        Fixture {
            pizza_double: quantity(&store, &ctx, &pizzas, 2000).await,
            pizza_single: quantity(&store, &ctx, &pizzas, 1000).await,
            drink_single: quantity(&store, &ctx, &drinks, 1000).await,
            cheese_single: quantity(&store, &ctx, &extras, 1000).await,
            services: Services::new(Repositories::memory(store.clone())),
            store,
            ctx,
            pizza,
            drink,
            cheese,
            sizeless,
        }
    }

    pub async fn pickup_order(&self) -> Order {
        self.services
            .orders
            .create_order(
                &self.ctx,
                CreateOrderRequest {
                    kind: OrderKind::Pickup(PickupOrder {
                        name: "Ana".to_string(),
                        status: Default::default(),
                    }),
                    observation: None,
                },
            )
            .await
            .unwrap()
    }

    pub async fn add(
        &self,
        order_id: Uuid,
        product: &Product,
        quantity: &Quantity,
    ) -> ItemIdAndGroupItem {
        self.services
            .items
            .add_item_order(&self.ctx, add_request(order_id, product, quantity))
            .await
            .unwrap()
    }
}

pub fn add_request(order_id: Uuid, product: &Product, quantity: &Quantity) -> AddItemRequest {
    AddItemRequest {
        order_id,
        product_id: product.id,
        quantity_id: quantity.id,
        group_item_id: None,
        observation: None,
    }
}

async fn section(
    store: &MemoryStore,
    ctx: &RequestContext,
    name: &str,
    need_print: bool,
    size: &str,
) -> Section {
    let category = Category {
        id: Uuid::new_v4(),
        name: name.to_string(),
        need_print,
    };
    let size = Size {
        id: Uuid::new_v4(),
        name: size.to_string(),
        category_id: category.id,
    };
    store.insert_category(ctx, category.clone()).await.unwrap();
    store.insert_size(ctx, size.clone()).await.unwrap();
    Section { category, size }
}

fn product_value(section: &Section, name: &str, cents: i64, is_available: bool) -> Product {
    Product {
        id: Uuid::new_v4(),
        code: name.to_uppercase().replace(' ', "-"),
        name: name.to_string(),
        description: None,
        price: Money::from_cents(cents),
        cost: Money::from_cents(cents / 2),
        is_available,
        category_id: section.category.id,
        category: None,
        size_id: Some(section.size.id),
        size: None,
    }
}

async fn product(
    store: &MemoryStore,
    ctx: &RequestContext,
    section: &Section,
    name: &str,
    cents: i64,
    is_available: bool,
) -> Product {
    let product = product_value(section, name, cents, is_available);
    store.insert_product(ctx, product.clone()).await.unwrap();
    product
}

async fn quantity(
    store: &MemoryStore,
    ctx: &RequestContext,
    section: &Section,
    thousandths: i64,
) -> Quantity {
    let quantity = Quantity {
        id: Uuid::new_v4(),
        category_id: section.category.id,
        value: Multiplier::from_thousandths(thousandths),
    };
    store.insert_quantity(ctx, quantity.clone()).await.unwrap();
    quantity
}
