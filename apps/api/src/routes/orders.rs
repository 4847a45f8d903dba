//! Order endpoints.
//!
//! ```text
//! POST /orders                          create
//! GET  /orders?status=pending,ready     list
//! GET  /orders/{id}                     full order
//! POST /orders/{id}/{pending|finish|cancel|archive|unarchive}
//! POST /orders/{id}/payments
//! PUT  /orders/{id}/observation
//! POST /orders/{id}/pickup/{launch|pick-up}
//! POST /orders/{id}/delivery/{launch|finish}
//! PUT  /orders/{id}/delivery/driver
//! POST /orders/{id}/table/close
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use comanda_core::{Order, OrderStatus};
use comanda_service::{AddPaymentRequest, CreateOrderRequest};

use super::{parse_statuses, ObservationRequest};
use crate::error::ApiResult;
use crate::tenant::Tenant;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DriverRequest {
    pub driver_id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/pending", post(pending_order))
        .route("/orders/{id}/finish", post(finish_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/archive", post(archive_order))
        .route("/orders/{id}/unarchive", post(unarchive_order))
        .route("/orders/{id}/payments", post(add_payment))
        .route("/orders/{id}/observation", put(update_observation))
        .route("/orders/{id}/pickup/launch", post(launch_pickup))
        .route("/orders/{id}/pickup/pick-up", post(pick_up))
        .route("/orders/{id}/delivery/launch", post(launch_delivery))
        .route("/orders/{id}/delivery/finish", post(finish_delivery))
        .route("/orders/{id}/delivery/driver", put(update_delivery_driver))
        .route("/orders/{id}/table/close", post(close_table))
}

// =============================================================================
// Lifecycle
// =============================================================================

async fn create_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.services.orders.create_order(&ctx, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Without `status`, every status is listed.
async fn list_orders(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    let statuses = parse_statuses::<OrderStatus>(query.status.as_deref())?
        .unwrap_or_else(|| OrderStatus::ALL.to_vec());
    let orders = state.services.orders.orders_by_status(&ctx, &statuses).await?;
    Ok(Json(orders))
}

async fn get_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.get_order(&ctx, id).await?))
}

async fn pending_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.pending_order(&ctx, id).await?))
}

async fn finish_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.finish_order(&ctx, id).await?))
}

async fn cancel_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.cancel_order(&ctx, id).await?))
}

async fn archive_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.archive_order(&ctx, id).await?))
}

async fn unarchive_order(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.unarchive_order(&ctx, id).await?))
}

async fn add_payment(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<AddPaymentRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.add_payment(&ctx, id, request).await?))
}

async fn update_observation(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<ObservationRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .services
        .orders
        .update_observation(&ctx, id, request.observation)
        .await?;
    Ok(Json(order))
}

// =============================================================================
// Kinds
// =============================================================================

async fn launch_pickup(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.launch_pickup(&ctx, id).await?))
}

async fn pick_up(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.pick_up(&ctx, id).await?))
}

async fn launch_delivery(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .services
        .orders
        .launch_delivery(&ctx, id, request.driver_id)
        .await?;
    Ok(Json(order))
}

async fn finish_delivery(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.finish_delivery(&ctx, id).await?))
}

async fn update_delivery_driver(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<DriverRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .services
        .orders
        .update_delivery_driver(&ctx, id, request.driver_id)
        .await?;
    Ok(Json(order))
}

async fn close_table(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.services.orders.close_table(&ctx, id).await?))
}
