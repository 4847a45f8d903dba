//! # Catalog Types
//!
//! Read-only reference data consulted when an item is ordered: products,
//! their category and size, and the quantity multipliers a category offers.
//!
//! ```text
//! Category "Pizzas" (need_print = true)
//!   ├── Size "Large"
//!   ├── Quantity 1/2, 1
//!   └── Product "Margherita Large"  price 45.00  cost 18.00
//! ```
//!
//! The catalog is maintained elsewhere; this crate only reads it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::{Money, Multiplier};

/// A preparation category. Groups are formed per (order, category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// Whether kitchen tickets are printed for groups of this category.
    pub need_print: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Size {
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
}

/// A quantity option offered by a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity {
    pub id: Uuid,
    pub category_id: Uuid,
    pub value: Multiplier,
}

/// A sellable product.
///
/// `category` and `size` are populated by `ProductRepository` lookups; a
/// product whose relations could not be resolved carries `None` and cannot
/// be ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost: Money,
    pub is_available: bool,
    pub category_id: Uuid,
    pub category: Option<Category>,
    pub size_id: Option<Uuid>,
    pub size: Option<Size>,
}
