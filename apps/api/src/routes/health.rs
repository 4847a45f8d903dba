use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Health check endpoint. Pings the database when there is one.
async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let storage = match &state.database {
        Some(db) => {
            if !db.health_check().await {
                return Err(ApiError::unavailable("database unreachable"));
            }
            "postgres"
        }
        None => "memory",
    };

    Ok(Json(HealthResponse {
        status: "ok",
        storage,
    }))
}
