//! # comanda-core: Order Lifecycle for Comanda
//!
//! The state machines at the heart of the restaurant backend, as pure code
//! with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/api (axum)                                 │   │
//! │  │   POST /items   POST /items/{id}/start   POST /orders/{id}/...  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            comanda-service (ItemService, OrderService)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ comanda-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌────────────┐  ┌─────────┐  ┌──────────────┐   │   │
//! │  │   │  item   │  │ group_item │  │  order  │  │  repository  │   │   │
//! │  │   │  Item   │  │ GroupItem  │  │  Order  │  │   traits     │   │   │
//! │  │   └─────────┘  └────────────┘  └─────────┘  └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           comanda-db (PostgreSQL, one schema per tenant)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`item`] - Item state machine and per-item totals
//! - [`group_item`] - Group state machine and aggregate totals
//! - [`order`] - Order lifecycle, order kinds, payments
//! - [`catalog`] - Products, categories, sizes, quantities
//! - [`money`] - Integer cents and quantity multipliers
//! - [`tenant`] - Tenant schema and request context
//! - [`repository`] - Storage traits
//! - [`error`] / [`validation`] - Error taxonomy and input checks
//!
//! ## Example
//!
//! ```rust
//! use comanda_core::money::{Money, Multiplier};
//! use comanda_core::ItemStatus;
//!
//! let unit = Money::from_cents(1000);
//! assert_eq!(unit.times(Multiplier::from_units(2)).cents(), 2000);
//! assert_eq!(ItemStatus::default(), ItemStatus::Pending);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

mod macros;

pub mod catalog;
pub mod error;
pub mod group_item;
pub mod item;
pub mod money;
pub mod order;
pub mod repository;
pub mod tenant;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{Category, Product, Quantity, Size};
pub use error::{CoreError, CoreResult, ValidationError};
pub use group_item::{GroupItem, GroupItemStatus};
pub use item::{AdditionalItem, Item, ItemStatus};
pub use money::{Money, Multiplier};
pub use order::{
    DeliveryOrder, DeliveryStatus, Order, OrderKind, OrderStatus, PaymentMethod, PaymentOrder,
    PickupOrder, PickupStatus, TableOrder, TableStatus,
};
pub use tenant::{RequestContext, TenantSchema};
