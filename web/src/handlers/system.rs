//! System lifecycle endpoints.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use liftsim_core::{System, SystemMetrics, SystemStatus, TrafficIntensity};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body of `POST /system/configure`.
#[derive(Debug, Deserialize)]
pub struct ConfigureRequest {
    /// Floor count (numbered from 0).
    pub floors: u32,
    /// Lift count (named from L1).
    pub lifts: u32,
}

/// Body of `POST /system/simulate-traffic`.
#[derive(Debug, Deserialize)]
pub struct SimulateTrafficRequest {
    /// Simulation length in seconds.
    pub duration_secs: u32,
    /// `"low"`, `"medium"`, or `"high"`.
    pub intensity: String,
}

/// Response wrapper for accepted async operations.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    /// Human-readable confirmation.
    pub message: String,
}

/// `POST /system/configure`: create (or replace) the building.
pub async fn configure(
    State(state): State<AppState>,
    Json(request): Json<ConfigureRequest>,
) -> Result<Json<System>, AppError> {
    let system = state.system.configure(request.floors, request.lifts).await?;
    Ok(Json(system))
}

/// `GET /system/configuration`.
pub async fn configuration(State(state): State<AppState>) -> Result<Json<System>, AppError> {
    Ok(Json(state.system.configuration().await?))
}

/// `GET /system/status`.
pub async fn status(State(state): State<AppState>) -> Result<Json<SystemStatus>, AppError> {
    Ok(Json(state.system.status().await?))
}

/// `GET /system/metrics`.
pub async fn metrics(State(state): State<AppState>) -> Result<Json<SystemMetrics>, AppError> {
    Ok(Json(state.system.metrics().await?))
}

/// `POST /system/reset`: lifts to ground, ledger cleared.
pub async fn reset(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.system.reset().await?;
    Ok(Json(json!({ "message": "system reset" })))
}

/// `POST /system/simulate-traffic`: 202, simulation runs in the background.
pub async fn simulate_traffic(
    State(state): State<AppState>,
    Json(request): Json<SimulateTrafficRequest>,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError> {
    let intensity: TrafficIntensity = request
        .intensity
        .parse()
        .map_err(|error: liftsim_core::DomainError| AppError::bad_request(error.to_string()))?;
    state
        .system
        .simulate_traffic(request.duration_secs, intensity)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            message: format!("traffic simulation started ({intensity})"),
        }),
    ))
}
