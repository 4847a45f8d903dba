//! Item endpoints used by order-taking terminals and the kitchen.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use uuid::Uuid;

use comanda_core::Item;
use comanda_service::{
    AddAdditionalRequest, AddItemRequest, ItemIdAndGroupItem, UpdateQuantityRequest,
};

use super::ObservationRequest;
use crate::error::ApiResult;
use crate::tenant::Tenant;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", post(add_item))
        .route("/items/{id}", delete(delete_item))
        .route("/items/{id}/start", post(start_item))
        .route("/items/{id}/ready", post(ready_item))
        .route("/items/{id}/cancel", post(cancel_item))
        .route("/items/{id}/observation", put(update_observation))
        .route("/items/{id}/quantity", put(update_quantity))
        .route("/items/{id}/additionals", post(add_additional))
        .route(
            "/items/{id}/additionals/{additional_id}",
            delete(remove_additional),
        )
}

async fn add_item(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<(StatusCode, Json<ItemIdAndGroupItem>)> {
    let added = state.services.items.add_item_order(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

async fn delete_item(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.items.delete_item_order(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn start_item(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Item>> {
    Ok(Json(state.services.items.start_item(&ctx, id).await?))
}

async fn ready_item(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Item>> {
    Ok(Json(state.services.items.ready_item(&ctx, id).await?))
}

async fn cancel_item(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Item>> {
    Ok(Json(state.services.items.cancel_item(&ctx, id).await?))
}

async fn update_observation(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<ObservationRequest>,
) -> ApiResult<Json<Item>> {
    let item = state
        .services
        .items
        .update_item_observation(&ctx, id, request.observation)
        .await?;
    Ok(Json(item))
}

async fn update_quantity(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateQuantityRequest>,
) -> ApiResult<Json<Item>> {
    let item = state
        .services
        .items
        .update_item_quantity(&ctx, id, request)
        .await?;
    Ok(Json(item))
}

async fn add_additional(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<AddAdditionalRequest>,
) -> ApiResult<Json<Item>> {
    let item = state
        .services
        .items
        .add_additional_item(&ctx, id, request)
        .await?;
    Ok(Json(item))
}

async fn remove_additional(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path((id, additional_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Item>> {
    let item = state
        .services
        .items
        .remove_additional_item(&ctx, id, additional_id)
        .await?;
    Ok(Json(item))
}
