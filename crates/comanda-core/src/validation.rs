//! # Validation Module
//!
//! Input checks run before any state transition.
//!
//! ```text
//! HTTP body (serde) ──► validate_* (this module) ──► domain transition
//!                                                      │
//!                                                      ▼
//!                                     PostgreSQL constraints (last line)
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of free-text observations on items and orders.
pub const MAX_OBSERVATION_LEN: usize = 500;

/// Maximum length of the name called out for a pickup order.
pub const MAX_PICKUP_NAME_LEN: usize = 100;

/// PostgreSQL truncates identifiers at 63 bytes.
pub const MAX_SCHEMA_NAME_LEN: usize = 63;

const RESERVED_SCHEMAS: &[&str] = &["public", "information_schema"];

/// Validates a tenant schema name.
///
/// ## Rules
/// - 1 to 63 characters
/// - starts with a lowercase ASCII letter
/// - only lowercase ASCII letters, digits and `_`
/// - not a system schema (`pg_*`, `public`, `information_schema`)
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_schema_name;
///
/// assert!(validate_schema_name("bistro_centro").is_ok());
/// assert!(validate_schema_name("Bistro").is_err());
/// ```
pub fn validate_schema_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "schema".to_string(),
        });
    }

    if name.len() > MAX_SCHEMA_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "schema".to_string(),
            max: MAX_SCHEMA_NAME_LEN,
        });
    }

    let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_lowercase());
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !starts_with_letter || !valid_chars {
        return Err(ValidationError::InvalidFormat {
            field: "schema".to_string(),
            reason: "must start with a lowercase letter and contain only a-z, 0-9 and _"
                .to_string(),
        });
    }

    if name.starts_with("pg_") || RESERVED_SCHEMAS.contains(&name) {
        return Err(ValidationError::InvalidFormat {
            field: "schema".to_string(),
            reason: format!("'{}' is reserved", name),
        });
    }

    Ok(())
}

/// Validates an optional observation ("no onions", "table by the window").
pub fn validate_observation(observation: Option<&str>) -> ValidationResult<()> {
    match observation {
        Some(text) if text.chars().count() > MAX_OBSERVATION_LEN => {
            Err(ValidationError::TooLong {
                field: "observation".to_string(),
                max: MAX_OBSERVATION_LEN,
            })
        }
        _ => Ok(()),
    }
}

/// Validates the customer name on a pickup order.
pub fn validate_pickup_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PICKUP_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PICKUP_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
