//! The movement orchestrator: one task per trip.
//!
//! The lift entity is a value object with no notion of time; this module
//! drives it through the trip state machine with task suspensions between
//! transitions, so a building full of moving lifts costs a handful of
//! sleeping tasks, not threads.
//!
//! ```text
//! Available(C) ──begin_trip(T)──► Occupied(target=T, direction)
//!      ──travel |T−C| × floor_travel──► Occupied(current=T, Idle)
//!      ──doors open + close──► Available(T)
//! ```
//!
//! Persistence failures mid-trip are logged and the trip continues; the
//! in-memory state is authoritative until the doors close. The dispatch
//! mutex is never held here.

use crate::ledger::AssignmentLedger;
use crate::metrics::DispatchMetrics;
use liftsim_core::{EventBus, Floor, Lift, LiftEvent, Repository};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Simulated delays for one trip.
#[derive(Clone, Copy, Debug)]
pub struct TripTiming {
    /// Wall-clock delay per floor traversed.
    pub floor_travel: Duration,
    /// Door opening delay at arrival.
    pub door_open: Duration,
    /// Door closing delay at arrival.
    pub door_close: Duration,
}

impl Default for TripTiming {
    fn default() -> Self {
        Self {
            floor_travel: Duration::from_secs(2),
            door_open: Duration::from_millis(2500),
            door_close: Duration::from_millis(2500),
        }
    }
}

impl TripTiming {
    /// Millisecond-scale timing for tests.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            floor_travel: Duration::from_millis(5),
            door_open: Duration::from_millis(2),
            door_close: Duration::from_millis(2),
        }
    }
}

/// Sequences a single lift through its trip state machine on a background
/// task.
pub struct MovementOrchestrator {
    repo: Arc<dyn Repository>,
    bus: Arc<dyn EventBus>,
    ledger: Arc<AssignmentLedger>,
    metrics: Arc<DispatchMetrics>,
    timing: TripTiming,
}

impl MovementOrchestrator {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(
        repo: Arc<dyn Repository>,
        bus: Arc<dyn EventBus>,
        ledger: Arc<AssignmentLedger>,
        metrics: Arc<DispatchMetrics>,
        timing: TripTiming,
    ) -> Self {
        Self {
            repo,
            bus,
            ledger,
            metrics,
            timing,
        }
    }

    /// Run a trip on its own task. The caller (dispatch) has already
    /// committed the lift (`begin_trip`) and reserved the target slot; the
    /// task outlives the request that started it.
    pub fn spawn_trip(self: &Arc<Self>, lift: Lift, target: Floor) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run_trip(lift, target).await })
    }

    async fn run_trip(&self, mut lift: Lift, target: Floor) {
        let origin = lift.current_floor;
        info!(
            lift = %lift.name,
            origin,
            target = target.number,
            "trip started"
        );

        // Departing: the lift no longer serves its origin floor.
        match self.repo.get_floor_by_number(origin).await {
            Ok(origin_floor) => {
                if let Err(error) = self.ledger.unassign(origin_floor.id, lift.id).await {
                    warn!(lift = %lift.name, %error, "origin unassign failed");
                }
            }
            Err(error) => {
                // System reset mid-flight can remove the floor; the trip goes on.
                debug!(lift = %lift.name, floor = origin, %error, "origin floor lookup failed");
            }
        }

        if let Err(error) = self.ledger.assign(target.id, lift.id, target.number).await {
            warn!(lift = %lift.name, %error, "target reservation re-assert failed");
        }
        self.persist(&lift).await;

        // Assignment is observable before the first travel tick.
        self.bus.publish(LiftEvent::LiftAssigned {
            lift_id: lift.id,
            floor_number: target.number,
        });

        // Travel, one floor per tick.
        while lift.current_floor != target.number {
            tokio::time::sleep(self.timing.floor_travel).await;
            let next = if target.number > lift.current_floor {
                lift.current_floor + 1
            } else {
                lift.current_floor - 1
            };
            lift.advance_to(next);
            self.bus.publish(LiftEvent::LiftMoved {
                lift_id: lift.id,
                floor: next,
            });
        }

        lift.arrive();
        self.persist(&lift).await;

        tokio::time::sleep(self.timing.door_open).await;
        tokio::time::sleep(self.timing.door_close).await;

        lift.make_available();
        self.persist(&lift).await;
        self.bus.publish(LiftEvent::LiftArrived {
            lift_id: lift.id,
            floor_id: target.id,
            floor_number: target.number,
        });
        self.metrics.record_completed_trip();
        info!(lift = %lift.name, floor = target.number, "trip completed");
    }

    /// Trips survive persistence failures; the write is retried at the next
    /// transition anyway.
    async fn persist(&self, lift: &Lift) {
        if let Err(error) = self.repo.update_lift(lift.clone()).await {
            warn!(
                lift = %lift.name,
                %error,
                "lift persist failed mid-trip, continuing on in-memory state"
            );
        }
    }
}
