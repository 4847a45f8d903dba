//! Kitchen display queries.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use comanda_core::{GroupItem, GroupItemStatus};

use super::parse_statuses;
use crate::error::ApiResult;
use crate::tenant::Tenant;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListGroupsQuery {
    pub status: Option<String>,
    pub order_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/group-items", get(list_groups))
        .route("/group-items/{id}", get(get_group))
}

async fn get_group(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<GroupItem>> {
    Ok(Json(state.services.groups.get_group(&ctx, id).await?))
}

/// `?status=` narrows the result, `?order_id=` scopes it to one order.
/// Without either, every group of the tenant is listed.
async fn list_groups(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(query): Query<ListGroupsQuery>,
) -> ApiResult<Json<Vec<GroupItem>>> {
    let statuses = parse_statuses::<GroupItemStatus>(query.status.as_deref())?;

    let groups = match query.order_id {
        Some(order_id) => {
            state
                .services
                .groups
                .groups_by_order(&ctx, order_id, statuses.as_deref())
                .await?
        }
        None => {
            let statuses = statuses.unwrap_or_else(|| GroupItemStatus::ALL.to_vec());
            state.services.groups.groups_by_status(&ctx, &statuses).await?
        }
    };
    Ok(Json(groups))
}
