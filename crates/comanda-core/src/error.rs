//! # Error Types
//!
//! Domain errors for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core (this file)                                              │
//! │  ├── CoreError        - Not-found, transitions, prerequisites, tenant  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  comanda-db                                                            │
//! │  └── DbError          - Storage failures, folded into CoreError        │
//! │                                                                         │
//! │  apps/api                                                              │
//! │  └── ApiError         - { code, message } + HTTP status                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError;  CoreError → ApiError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services return the first error they hit without wrapping it, so every
//! variant here carries enough context to be shown to the caller as-is.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the domain model, the services and (after conversion)
/// the repositories.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A requested entity does not exist in the tenant's schema.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A state machine rejected the requested action.
    ///
    /// ## Example
    /// ```text
    /// ready_item() on a PENDING item
    ///      │
    ///      ▼
    /// InvalidTransition { entity: "item", from: "pending", action: "ready" }
    /// ```
    #[error("cannot {action} {entity} in status {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    /// Items can only be added to a group that is still staging or pending.
    #[error("group not staging")]
    GroupNotStaging,

    /// A group was asked to become ready while some item is still in progress.
    #[error("not all items are ready")]
    NotAllItemsReady,

    /// An order was asked to finish while some group is still in progress.
    #[error("not all group items are ready")]
    NotAllGroupsReady,

    /// The product has no category attached.
    #[error("category not found")]
    CategoryNotFound,

    /// The product has no size attached.
    #[error("size not found")]
    SizeNotFound,

    /// The product is switched off in the catalog.
    #[error("product {0} is not available")]
    ProductUnavailable(String),

    /// The chosen quantity is configured for a different category.
    #[error("quantity {quantity_id} does not belong to category {category_id}")]
    QuantityNotInCategory {
        quantity_id: String,
        category_id: String,
    },

    /// Payments are only accepted while the order is pending or ready.
    #[error("order must be pending")]
    OrderMustBePending,

    /// An order cannot leave staging without at least one group.
    #[error("order has no items")]
    OrderWithoutItems,

    /// The order no longer accepts changes.
    #[error("order {0} is closed")]
    OrderClosed(String),

    /// A pickup/delivery/table action was sent to an order of another kind.
    #[error("order is a {actual} order, not a {expected} order")]
    WrongOrderKind {
        expected: &'static str,
        actual: &'static str,
    },

    /// An explicit group id was given that belongs to a different order.
    #[error("group item {group_item_id} does not belong to order {order_id}")]
    GroupNotInOrder {
        group_item_id: String,
        order_id: String,
    },

    /// The request carried no tenant schema.
    #[error("schema not found")]
    SchemaNotSet,

    /// A write lost an optimistic concurrency race.
    ///
    /// ## When This Occurs
    /// Two requests load the same row, both mutate it, the second
    /// `UPDATE ... WHERE version = $n` matches zero rows.
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: String, id: String },

    /// Storage failed (connection, transaction, query).
    #[error("storage error: {0}")]
    Storage(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Conflict error for a given entity type and ID.
    pub fn conflict(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::Conflict {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates an InvalidTransition error.
    pub fn invalid_transition(
        entity: &'static str,
        from: impl ToString,
        action: &'static str,
    ) -> Self {
        CoreError::InvalidTransition {
            entity,
            from: from.to_string(),
            action,
        }
    }

    /// True when the caller sent something the domain rejects, false for
    /// storage failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CoreError::Storage(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
