//! # Liftsim Runtime
//!
//! The dispatch and movement subsystem: the event-driven mediator between
//! floor calls and moving lifts.
//!
//! - [`Dispatcher`] accepts calls, enforces the per-floor assignment cap
//!   under the dispatch mutex, and selects lifts.
//! - [`MovementOrchestrator`] runs each trip on its own task, driving the
//!   lift state machine with simulated delays.
//! - [`StatusBroadcaster`] fans status updates out to per-topic subscribers.
//! - [`SystemService`] owns configuration, reset, and the operator surface.
//!
//! [`LiftRuntime::new`] wires all of it to a repository and an event bus and
//! subscribes the handlers; the transport only ever touches the three
//! service handles it exposes.

#![forbid(unsafe_code)]

pub mod broadcaster;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod lifecycle;
pub mod metrics;
pub mod movement;

pub use broadcaster::{
    BroadcastRunner, SinkError, StatusBroadcaster, StatusSink, StatusUpdate, SubscriberId,
    TopicKind,
};
pub use dispatcher::{DispatchHandler, Dispatcher};
pub use error::{DispatchError, LifecycleError};
pub use handlers::{FloorArrivalHandler, StatusRelayHandler};
pub use ledger::AssignmentLedger;
pub use lifecycle::SystemService;
pub use metrics::{DispatchCounters, DispatchMetrics};
pub use movement::{MovementOrchestrator, TripTiming};

use liftsim_core::{EventBus, EventKind, Repository};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Tunables for the assembled runtime.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    /// Simulated trip delays.
    pub timing: TripTiming,
    /// Bound on the broadcaster's update channel.
    pub broadcast_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timing: TripTiming::default(),
            broadcast_depth: 64,
        }
    }
}

/// The fully wired dispatch runtime.
///
/// Dropping it does not stop in-flight trips; call [`LiftRuntime::shutdown`]
/// to stop the broadcaster loop (trips are deliberately left to finish).
pub struct LiftRuntime {
    /// Floor-call entry point and operator move override.
    pub dispatcher: Arc<Dispatcher>,
    /// Lifecycle and maintenance operations.
    pub system: Arc<SystemService>,
    /// Status fan-out the transport registers subscribers with.
    pub broadcaster: Arc<StatusBroadcaster>,
    /// Dispatch counters.
    pub metrics: Arc<DispatchMetrics>,
    shutdown: watch::Sender<bool>,
    broadcast_task: Mutex<Option<JoinHandle<()>>>,
}

impl LiftRuntime {
    /// Wire the runtime to a repository and an event bus.
    ///
    /// Spawns the broadcaster run loop and subscribes the dispatch,
    /// floor-reset, and status-relay handlers. Must run inside a tokio
    /// runtime.
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>, bus: Arc<dyn EventBus>, config: RuntimeConfig) -> Self {
        let metrics = Arc::new(DispatchMetrics::new());
        let ledger = Arc::new(AssignmentLedger::new(Arc::clone(&repo)));
        let orchestrator = Arc::new(MovementOrchestrator::new(
            Arc::clone(&repo),
            Arc::clone(&bus),
            Arc::clone(&ledger),
            Arc::clone(&metrics),
            config.timing,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&repo),
            Arc::clone(&bus),
            Arc::clone(&ledger),
            orchestrator,
            Arc::clone(&metrics),
        ));
        let system = Arc::new(SystemService::new(
            Arc::clone(&repo),
            Arc::clone(&bus),
            Arc::clone(&ledger),
            Arc::clone(&metrics),
        ));

        let (broadcaster, runner) = StatusBroadcaster::new(config.broadcast_depth);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let broadcast_task = tokio::spawn(runner.run(shutdown_rx));

        bus.subscribe(
            EventKind::LiftRequested,
            Arc::new(DispatchHandler::new(Arc::clone(&dispatcher))),
        );
        bus.subscribe(
            EventKind::LiftArrived,
            Arc::new(FloorArrivalHandler::new(Arc::clone(&repo), Arc::clone(&bus))),
        );
        let relay: Arc<dyn liftsim_core::EventHandler> =
            Arc::new(StatusRelayHandler::new(Arc::clone(&broadcaster)));
        bus.subscribe(EventKind::LiftAssigned, Arc::clone(&relay));
        bus.subscribe(EventKind::LiftMoved, Arc::clone(&relay));
        bus.subscribe(EventKind::LiftArrived, relay);

        Self {
            dispatcher,
            system,
            broadcaster,
            metrics,
            shutdown,
            broadcast_task: Mutex::new(Some(broadcast_task)),
        }
    }

    /// Stop the broadcaster run loop and wait for it to exit. In-flight
    /// trips keep running; the process-level shutdown timeout bounds the
    /// overall wait.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        let task = self
            .broadcast_task
            .lock()
            .expect("runtime shutdown lock poisoned")
            .take();
        if let Some(task) = task {
            if let Err(error) = task.await {
                warn!(%error, "broadcaster task ended abnormally");
            }
        }
    }
}
