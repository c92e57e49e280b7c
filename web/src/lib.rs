//! Axum transport for the lift simulation.
//!
//! The transport is a thin shell: handlers extract request data, call into
//! the runtime services ([`liftsim_runtime::Dispatcher`] and
//! [`liftsim_runtime::SystemService`]), and map results to HTTP responses.
//! The WebSocket endpoint adapts each connection to a
//! [`liftsim_runtime::StatusSink`] and registers it with the broadcaster;
//! the broadcaster itself never sees a socket.
//!
//! # Surface
//!
//! ```text
//! POST /api/v1/system/configure          {floors, lifts}          200 / 400
//! GET  /api/v1/system/configuration                               200 / 404
//! GET  /api/v1/system/status                                      200 / 404
//! GET  /api/v1/system/metrics                                     200 / 404
//! POST /api/v1/system/reset                                       200 / 404
//! POST /api/v1/system/simulate-traffic   {duration_secs,intensity} 202
//! GET  /api/v1/lifts                                              200
//! GET  /api/v1/lifts/:id                                          200 / 404
//! POST /api/v1/lifts/:id/move            {target_floor}           202 / 400 / 404
//! PUT  /api/v1/lifts/:id/status          {status}                 200 / 404
//! PUT  /api/v1/lifts/:id/reset                                    200 / 404
//! PUT  /api/v1/lifts/reset                                        200
//! GET  /api/v1/floors                                             200
//! GET  /api/v1/floors/active-calls                                200
//! GET  /api/v1/floors/:floor_number                               200 / 404
//! POST /api/v1/floors/:floor_number/call {direction}              202 / 400 / 404
//! POST /api/v1/floors/:floor_number/reset                         200 / 404
//! GET  /health                                                    200
//! GET  /ws                                                        status stream
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
