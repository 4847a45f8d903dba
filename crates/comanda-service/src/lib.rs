//! # comanda-service: Order Workflow Coordination
//!
//! The services in this crate run every operation that touches more than one
//! aggregate: adding an item opens (or reuses) a group and refreshes the
//! group and order totals, readying the last item readies its group and then
//! maybe the order, and so on.
//!
//! ## Cascade Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ItemService                                                           │
//! │  ├── add_item_order    item ─► group totals ─► order totals            │
//! │  ├── start_item        item ─► group PENDING/STARTED                   │
//! │  ├── ready_item        item ─► group READY? ─► order READY?            │
//! │  ├── cancel_item       item ─► group totals / CANCELLED / READY?       │
//! │  ├── delete_item_order item ─► group deleted / settled ─► order        │
//! │  └── quantity, add-ons item totals ─► group totals ─► order totals     │
//! │                                                                         │
//! │  OrderService          order ─► groups ─► items (pending, cancel)      │
//! │  GroupItemService      kitchen queries                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services hold no locks and no state besides their repositories. Every
//! call takes the caller's [`RequestContext`](comanda_core::RequestContext).
//! Storage failures in the middle of a cascade are returned as they are;
//! nothing is rolled back across aggregates.
//!
//! ## Storage
//! Services only see the traits in `comanda_core::repository`. Wire them to
//! PostgreSQL (`comanda-db`) or to [`memory::MemoryStore`] through
//! [`Repositories`].

pub mod group_item;
pub mod item;
pub mod memory;
pub mod order;

mod cascade;

use std::sync::Arc;

use comanda_core::repository::{
    GroupItemRepository, ItemRepository, OrderRepository, ProductRepository, QuantityRepository,
};

pub use group_item::GroupItemService;
pub use item::{
    AddAdditionalRequest, AddItemRequest, ItemIdAndGroupItem, ItemService, UpdateQuantityRequest,
};
pub use memory::MemoryStore;
pub use order::{AddPaymentRequest, CreateOrderRequest, OrderService};

/// The storage seams every service is built from.
#[derive(Clone)]
pub struct Repositories {
    pub items: Arc<dyn ItemRepository>,
    pub groups: Arc<dyn GroupItemRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub quantities: Arc<dyn QuantityRepository>,
}

impl Repositories {
    /// Every repository served by one in-memory store.
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Repositories {
            items: store.clone(),
            groups: store.clone(),
            orders: store.clone(),
            products: store.clone(),
            quantities: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}

/// All services over one set of repositories.
#[derive(Debug, Clone)]
pub struct Services {
    pub items: ItemService,
    pub orders: OrderService,
    pub groups: GroupItemService,
}

impl Services {
    pub fn new(repos: Repositories) -> Self {
        Services {
            items: ItemService::new(repos.clone()),
            orders: OrderService::new(repos.clone()),
            groups: GroupItemService::new(repos),
        }
    }
}
