//! Route tables.
//!
//! Every handler takes the [`Tenant`](crate::tenant::Tenant) extractor,
//! calls one service operation and returns JSON.

pub mod groups;
pub mod health;
pub mod items;
pub mod orders;

use std::str::FromStr;

use axum::Router;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// Body of the observation endpoints. `null` or blank clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationRequest {
    #[serde(default)]
    pub observation: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(items::router())
        .merge(groups::router())
}

/// Parses `?status=pending,ready` into statuses. `None` when absent.
pub(crate) fn parse_statuses<T>(raw: Option<&str>) -> Result<Option<Vec<T>>, ApiError>
where
    T: FromStr<Err = comanda_core::ValidationError>,
{
    let Some(raw) = raw else {
        return Ok(None);
    };

    let statuses = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .collect::<Result<Vec<_>, _>>()?;

    if statuses.is_empty() {
        return Ok(None);
    }
    Ok(Some(statuses))
}
