//! Tenant selection from the `x-tenant-schema` header.
//!
//! A request without the header gets an anonymous context, so the first
//! service call fails with `SCHEMA_NOT_SET`. A malformed schema name is
//! rejected here with `VALIDATION_ERROR`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use comanda_core::{RequestContext, TenantSchema};

use crate::error::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-schema";

/// Request context bound to the caller's tenant.
#[derive(Debug, Clone)]
pub struct Tenant(pub RequestContext);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(TENANT_HEADER) {
            Some(value) => value,
            None => return Ok(Tenant(RequestContext::anonymous())),
        };

        let name = header
            .to_str()
            .map_err(|_| ApiError::bad_request("tenant header is not valid text"))?;
        let schema = TenantSchema::new(name.trim())?;

        Ok(Tenant(RequestContext::for_tenant(schema)))
    }
}
