//! # Tenant Context
//!
//! Every tenant owns a PostgreSQL schema. The schema name travels with each
//! request in a [`RequestContext`] and every repository call reads it from
//! there.
//!
//! ```text
//! HTTP request ── x-tenant-schema: bistro_centro ──► RequestContext
//!                                                         │
//!   ItemService::start_item(&ctx, id)                     │
//!        └── items.get_item_by_id(&ctx, id) ──► ctx.schema()?
//!                                                  │
//!                                                  ▼
//!                           SELECT ... FROM "bistro_centro"."items"
//! ```
//!
//! The schema name ends up inside SQL text, so it is validated once on
//! construction and cannot be built any other way.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::validate_schema_name;

// =============================================================================
// Tenant Schema
// =============================================================================

/// A validated schema identifier: lowercase ASCII letters, digits and
/// underscores, starting with a letter, at most 63 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantSchema(String);

impl TenantSchema {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_schema_name(&name)?;
        Ok(TenantSchema(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `"schema"."table"` for use in SQL text.
    ///
    /// `table` is always a literal from the storage code, never user input.
    pub fn qualify(&self, table: &str) -> String {
        format!("\"{}\".\"{}\"", self.0, table)
    }
}

impl fmt::Display for TenantSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantSchema {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TenantSchema::new(s)
    }
}

impl TryFrom<String> for TenantSchema {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TenantSchema::new(value)
    }
}

impl From<TenantSchema> for String {
    fn from(schema: TenantSchema) -> Self {
        schema.0
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Per-request execution context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    tenant: Option<TenantSchema>,
}

impl RequestContext {
    /// A context bound to a tenant.
    pub fn for_tenant(schema: TenantSchema) -> Self {
        RequestContext {
            tenant: Some(schema),
        }
    }

    /// A context without a tenant. Every repository call made with it fails
    /// with `SchemaNotSet`.
    pub fn anonymous() -> Self {
        RequestContext::default()
    }

    /// The tenant schema, or `SchemaNotSet`.
    pub fn schema(&self) -> CoreResult<&TenantSchema> {
        self.tenant.as_ref().ok_or(CoreError::SchemaNotSet)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_validation() {
        assert!(TenantSchema::new("bistro_centro").is_ok());
        assert!(TenantSchema::new("t1").is_ok());
        assert!(TenantSchema::new("").is_err());
        assert!(TenantSchema::new("1bistro").is_err());
        assert!(TenantSchema::new("Bistro").is_err());
        assert!(TenantSchema::new("bistro\"; drop table items; --").is_err());
        assert!(TenantSchema::new("pg_catalog").is_err());
        assert!(TenantSchema::new("a".repeat(64)).is_err());
    }

    #[test]
    fn test_qualify() {
        let schema = TenantSchema::new("bistro").unwrap();
        assert_eq!(schema.qualify("items"), "\"bistro\".\"items\"");
    }

    #[test]
    fn test_context_without_tenant() {
        let ctx = RequestContext::anonymous();
        assert!(matches!(ctx.schema(), Err(CoreError::SchemaNotSet)));

        let ctx = RequestContext::for_tenant("bistro".parse().unwrap());
        assert_eq!(ctx.schema().unwrap().as_str(), "bistro");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<TenantSchema, _> = serde_json::from_str("\"bistro\"");
        assert!(ok.is_ok());
        let bad: Result<TenantSchema, _> = serde_json::from_str("\"Bad Name\"");
        assert!(bad.is_err());
    }
}
