//! Lift endpoints: queries, the operator move override, and maintenance.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use liftsim_core::{Lift, LiftId, LiftStatus};
use serde::Deserialize;
use serde_json::{json, Value};

/// Body of `POST /lifts/:id/move`.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// Destination floor.
    pub target_floor: u32,
}

/// Body of `PUT /lifts/:id/status`.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    /// `"Available"`, `"Occupied"`, or `"OutOfService"`.
    pub status: String,
}

fn parse_lift_id(raw: &str) -> Result<LiftId, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request(format!("invalid lift id: {raw}")))
}

/// `GET /lifts`.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Lift>>, AppError> {
    Ok(Json(state.system.list_lifts().await?))
}

/// `GET /lifts/:id`.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Lift>, AppError> {
    let id = parse_lift_id(&id)?;
    Ok(Json(state.system.get_lift(id).await?))
}

/// `POST /lifts/:id/move`: operator override, 202 while the trip runs.
pub async fn move_lift(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = parse_lift_id(&id)?;
    state.dispatcher.move_lift(id, request.target_floor).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "lift move accepted" })),
    ))
}

/// `PUT /lifts/:id/status`.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Lift>, AppError> {
    let id = parse_lift_id(&id)?;
    let status: LiftStatus = request
        .status
        .parse()
        .map_err(|error: String| AppError::bad_request(error))?;
    Ok(Json(state.system.set_lift_status(id, status).await?))
}

/// `PUT /lifts/:id/reset`.
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Lift>, AppError> {
    let id = parse_lift_id(&id)?;
    Ok(Json(state.system.reset_lift(id).await?))
}

/// `PUT /lifts/reset`: every lift back to its initial state.
pub async fn reset_all(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.system.reset_all_lifts().await?;
    Ok(Json(json!({ "message": "all lifts reset" })))
}
