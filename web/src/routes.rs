//! Router configuration.

use crate::handlers::{floors, health, lifts, system, websocket};
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // System lifecycle
        .route("/system/configure", post(system::configure))
        .route("/system/configuration", get(system::configuration))
        .route("/system/status", get(system::status))
        .route("/system/metrics", get(system::metrics))
        .route("/system/reset", post(system::reset))
        .route("/system/simulate-traffic", post(system::simulate_traffic))
        // Lifts
        .route("/lifts", get(lifts::list))
        .route("/lifts/reset", put(lifts::reset_all))
        .route("/lifts/:id", get(lifts::get))
        .route("/lifts/:id/move", post(lifts::move_lift))
        .route("/lifts/:id/status", put(lifts::set_status))
        .route("/lifts/:id/reset", put(lifts::reset))
        // Floors
        .route("/floors", get(floors::list))
        .route("/floors/active-calls", get(floors::active_calls))
        .route("/floors/:floor_number", get(floors::get))
        .route("/floors/:floor_number/call", post(floors::call))
        .route("/floors/:floor_number/reset", post(floors::reset_buttons));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ws", get(websocket::status_stream))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
