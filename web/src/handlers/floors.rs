//! Floor endpoints: queries, the call button, and maintenance.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use liftsim_core::{Direction, Floor};
use serde::Deserialize;
use serde_json::{json, Value};

/// Body of `POST /floors/:floor_number/call`.
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    /// `0` = Up, `1` = Down. The stable integer encoding.
    pub direction: u8,
}

/// `GET /floors`.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Floor>>, AppError> {
    Ok(Json(state.system.list_floors().await?))
}

/// `GET /floors/active-calls`: numbers of floors with a lit button.
pub async fn active_calls(State(state): State<AppState>) -> Result<Json<Vec<u32>>, AppError> {
    Ok(Json(state.system.active_floor_calls().await?))
}

/// `GET /floors/:floor_number`.
pub async fn get(
    State(state): State<AppState>,
    Path(floor_number): Path<u32>,
) -> Result<Json<Floor>, AppError> {
    Ok(Json(state.system.get_floor_by_number(floor_number).await?))
}

/// `POST /floors/:floor_number/call`: 202, the call is served
/// asynchronously.
pub async fn call(
    State(state): State<AppState>,
    Path(floor_number): Path<u32>,
    Json(request): Json<CallRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let direction = Direction::try_from(request.direction)
        .map_err(|_| AppError::bad_request("invalid direction, must be 0 (Up) or 1 (Down)"))?;
    state.dispatcher.call_lift(floor_number, direction).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "lift call accepted, lift is on its way" })),
    ))
}

/// `POST /floors/:floor_number/reset`: clear the call buttons.
pub async fn reset_buttons(
    State(state): State<AppState>,
    Path(floor_number): Path<u32>,
) -> Result<Json<Floor>, AppError> {
    Ok(Json(state.system.reset_floor_buttons(floor_number).await?))
}
