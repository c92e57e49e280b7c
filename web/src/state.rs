//! Application state shared across HTTP handlers.

use liftsim_runtime::{Dispatcher, StatusBroadcaster, SystemService};
use std::sync::Arc;

/// Shared handles into the runtime. Cloned (cheaply, via `Arc`) per request.
#[derive(Clone)]
pub struct AppState {
    /// Floor-call entry point and operator move override.
    pub dispatcher: Arc<Dispatcher>,
    /// Lifecycle and maintenance operations.
    pub system: Arc<SystemService>,
    /// Status fan-out for the WebSocket endpoint.
    pub broadcaster: Arc<StatusBroadcaster>,
}

impl AppState {
    /// Bundle the runtime handles for the router.
    #[must_use]
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        system: Arc<SystemService>,
        broadcaster: Arc<StatusBroadcaster>,
    ) -> Self {
        Self {
            dispatcher,
            system,
            broadcaster,
        }
    }
}
