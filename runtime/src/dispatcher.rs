//! The dispatch engine.
//!
//! [`Dispatcher::call_lift`] is the sole entry point for floor-originated
//! requests: it validates, records the button press, publishes
//! `LiftRequested`, and returns; the caller gets its 202 while selection
//! happens on a bus task.
//!
//! The dispatch mutex protects exactly the *check-capacity-then-reserve*
//! window: no two concurrent dispatches can both observe `count < K` and
//! push a floor past its cap, and no two can commit the same lift. The
//! mutex is released before any movement begins.

use crate::error::DispatchError;
use crate::ledger::AssignmentLedger;
use crate::metrics::DispatchMetrics;
use crate::movement::MovementOrchestrator;
use futures::future::BoxFuture;
use liftsim_core::{
    Direction, EventBus, EventHandler, HandlerError, Lift, LiftEvent, LiftId, Repository,
    RepositoryError,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Selects a lift for each accepted call and hands it to the movement
/// orchestrator.
pub struct Dispatcher {
    repo: Arc<dyn Repository>,
    bus: Arc<dyn EventBus>,
    ledger: Arc<AssignmentLedger>,
    orchestrator: Arc<MovementOrchestrator>,
    pub(crate) metrics: Arc<DispatchMetrics>,
    /// Serialises capacity-check-and-reserve across concurrent dispatches.
    dispatch_lock: Mutex<()>,
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(
        repo: Arc<dyn Repository>,
        bus: Arc<dyn EventBus>,
        ledger: Arc<AssignmentLedger>,
        orchestrator: Arc<MovementOrchestrator>,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        Self {
            repo,
            bus,
            ledger,
            orchestrator,
            metrics,
            dispatch_lock: Mutex::new(()),
        }
    }

    /// Accept a floor call.
    ///
    /// Validates synchronously, lights the call button, publishes
    /// [`LiftEvent::LiftRequested`], and returns. Selection, the capacity
    /// verdict, and movement all happen asynchronously; a later cancellation
    /// by the transport is ignored.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidDirection`] for an `Idle` call,
    /// [`DispatchError::FloorNotFound`] / [`DispatchError::SystemUnconfigured`]
    /// when the targets are absent, plus repository failures.
    pub async fn call_lift(
        &self,
        floor_number: u32,
        direction: Direction,
    ) -> Result<(), DispatchError> {
        if !direction.is_call() {
            return Err(DispatchError::InvalidDirection(direction));
        }

        let mut floor = self
            .repo
            .get_floor_by_number(floor_number)
            .await
            .map_err(|error| floor_lookup_error(error, floor_number))?;
        self.repo.get_system().await.map_err(system_lookup_error)?;

        floor.press_button(direction)?;
        self.repo.update_floor(floor).await?;

        self.bus.publish(LiftEvent::LiftRequested {
            floor_number,
            direction,
        });
        info!(floor = floor_number, %direction, "lift call accepted");
        Ok(())
    }

    /// Operator override: send a specific lift to a floor, replacing its
    /// current assignment.
    ///
    /// # Errors
    ///
    /// 404-class errors for a missing lift or unconfigured system;
    /// [`DispatchError::TargetOutOfRange`], [`DomainError::AlreadyAtFloor`]
    /// (via `Domain`), [`DispatchError::LiftNotAvailable`], and
    /// [`DispatchError::FloorAtCapacity`] for rejected moves.
    ///
    /// [`DomainError::AlreadyAtFloor`]: liftsim_core::DomainError::AlreadyAtFloor
    pub async fn move_lift(&self, lift_id: LiftId, target_floor: u32) -> Result<(), DispatchError> {
        let mut lift = self.repo.get_lift(lift_id).await.map_err(|error| {
            if error.is_not_found() {
                DispatchError::LiftNotFound(lift_id)
            } else {
                error.into()
            }
        })?;
        let system = self.repo.get_system().await.map_err(system_lookup_error)?;

        if !system.contains_floor(target_floor) {
            return Err(DispatchError::TargetOutOfRange {
                floor: target_floor,
                total_floors: system.total_floors,
            });
        }
        if lift.current_floor == target_floor {
            return Err(liftsim_core::DomainError::AlreadyAtFloor(target_floor).into());
        }
        if !lift.is_available() {
            return Err(DispatchError::LiftNotAvailable(lift_id));
        }

        let target = self
            .repo
            .get_floor_by_number(target_floor)
            .await
            .map_err(|error| floor_lookup_error(error, target_floor))?;

        let guard = self.dispatch_lock.lock().await;
        // The override honours the capacity cap too, unless the lift already
        // holds one of the floor's slots.
        let assigned = self.ledger.list_for_floor(target.id).await?;
        if assigned.len() >= system.max_lifts_per_floor()
            && !assigned.iter().any(|assignee| assignee.id == lift.id)
        {
            return Err(DispatchError::FloorAtCapacity(target_floor));
        }

        lift.begin_trip(target_floor)?;
        self.repo.update_lift(lift.clone()).await?;
        self.ledger.assign(target.id, lift.id, target_floor).await?;
        drop(guard);

        info!(lift = %lift.name, floor = target_floor, "operator move dispatched");
        self.orchestrator.spawn_trip(lift, target);
        Ok(())
    }

    /// Serve one `LiftRequested` event: the capacity re-check, selection,
    /// and reservation, all under the dispatch mutex.
    pub(crate) async fn dispatch(
        &self,
        floor_number: u32,
        direction: Direction,
    ) -> Result<(), DispatchError> {
        // Direction is informational only: selection is nearest-to-ground,
        // not closest-going-same-direction.
        let _ = direction;

        let guard = self.dispatch_lock.lock().await;

        let floor = self
            .repo
            .get_floor_by_number(floor_number)
            .await
            .map_err(|error| floor_lookup_error(error, floor_number))?;
        let system = self.repo.get_system().await.map_err(system_lookup_error)?;

        // Re-read under the mutex: the count observed before the lock may be
        // stale.
        let assigned = self.ledger.list_for_floor(floor.id).await?;
        let cap = system.max_lifts_per_floor();
        if assigned.len() >= cap {
            drop(guard);
            self.metrics.record_capacity_rejection();
            warn!(floor = floor_number, cap, "floor at assignment capacity");
            self.bus.publish(LiftEvent::FloorAtCapacity { floor_number });
            return Ok(());
        }

        let lifts = self.repo.list_lifts().await?;
        let Some(mut lift) = select_nearest_to_ground(&lifts) else {
            drop(guard);
            self.metrics.record_failed_dispatch();
            warn!(floor = floor_number, "no available lift, system overloaded");
            return Ok(());
        };

        if lift.current_floor == floor_number {
            // Already there: reserve the slot and report the arrival without
            // a trip. The arrival handler clears the buttons.
            self.ledger.assign(floor.id, lift.id, floor_number).await?;
            drop(guard);
            info!(lift = %lift.name, floor = floor_number, "lift already at floor");
            self.bus.publish(LiftEvent::LiftArrived {
                lift_id: lift.id,
                floor_id: floor.id,
                floor_number,
            });
            self.metrics.record_completed_trip();
            return Ok(());
        }

        lift.begin_trip(floor_number)?;
        self.repo.update_lift(lift.clone()).await?;
        self.ledger.assign(floor.id, lift.id, floor_number).await?;
        drop(guard);

        info!(lift = %lift.name, floor = floor_number, "lift dispatched");
        self.orchestrator.spawn_trip(lift, floor);
        Ok(())
    }
}

/// Among available lifts, the one nearest the ground floor; ties go to the
/// first in list order.
fn select_nearest_to_ground(lifts: &[Lift]) -> Option<Lift> {
    lifts
        .iter()
        .filter(|lift| lift.is_available())
        .min_by_key(|lift| lift.current_floor)
        .cloned()
}

fn floor_lookup_error(error: RepositoryError, floor_number: u32) -> DispatchError {
    if error.is_not_found() {
        DispatchError::FloorNotFound(floor_number)
    } else {
        error.into()
    }
}

fn system_lookup_error(error: RepositoryError) -> DispatchError {
    if error.is_not_found() {
        DispatchError::SystemUnconfigured
    } else {
        error.into()
    }
}

/// Bus subscriber that runs the dispatch procedure for each accepted call.
pub struct DispatchHandler {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchHandler {
    /// Wrap a dispatcher for subscription to `LiftRequested`.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl EventHandler for DispatchHandler {
    fn name(&self) -> &str {
        "dispatch"
    }

    fn handle(&self, event: LiftEvent) -> BoxFuture<'static, Result<(), HandlerError>> {
        let dispatcher = Arc::clone(&self.dispatcher);
        Box::pin(async move {
            let LiftEvent::LiftRequested {
                floor_number,
                direction,
            } = event
            else {
                return Ok(());
            };
            if let Err(error) = dispatcher.dispatch(floor_number, direction).await {
                dispatcher.metrics.record_failed_dispatch();
                return Err(HandlerError::Other(error.to_string()));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftsim_core::LiftStatus;

    fn lift_at(name: &str, floor: u32, status: LiftStatus) -> Lift {
        let mut lift = Lift::new(LiftId::new(), name);
        lift.current_floor = floor;
        lift.status = status;
        lift
    }

    #[test]
    fn selection_prefers_the_ground_floor() {
        let lifts = vec![
            lift_at("L1", 4, LiftStatus::Available),
            lift_at("L2", 1, LiftStatus::Available),
            lift_at("L3", 3, LiftStatus::Available),
        ];
        let chosen = select_nearest_to_ground(&lifts).unwrap();
        assert_eq!(chosen.name, "L2");
    }

    #[test]
    fn selection_ties_break_by_list_order() {
        let lifts = vec![
            lift_at("L1", 2, LiftStatus::Available),
            lift_at("L2", 2, LiftStatus::Available),
        ];
        let chosen = select_nearest_to_ground(&lifts).unwrap();
        assert_eq!(chosen.name, "L1");
    }

    #[test]
    fn occupied_and_out_of_service_lifts_are_ineligible() {
        let lifts = vec![
            lift_at("L1", 0, LiftStatus::Occupied),
            lift_at("L2", 0, LiftStatus::OutOfService),
            lift_at("L3", 5, LiftStatus::Available),
        ];
        let chosen = select_nearest_to_ground(&lifts).unwrap();
        assert_eq!(chosen.name, "L3");

        let busy = vec![lift_at("L1", 0, LiftStatus::Occupied)];
        assert!(select_nearest_to_ground(&busy).is_none());
    }
}
