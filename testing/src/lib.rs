//! # Liftsim Testing
//!
//! Test doubles and helpers shared by the integration suites:
//!
//! - [`InMemoryRepository`]: a Vec-backed implementation of the repository
//!   port. Entities keep their creation order, which the dispatch tie-break
//!   ("first scanned wins") relies on.
//! - [`RecordingSink`]: a [`StatusSink`] that captures delivered updates.
//! - [`wait_until`]: polls an async condition with a timeout, for asserting
//!   on work that happens on background tasks.

#![forbid(unsafe_code)]

use futures::future::BoxFuture;
use liftsim_core::{
    EventHandler, EventKind, Floor, FloorId, HandlerError, Lift, LiftEvent, LiftId, Repository,
    RepositoryError, System,
};
use liftsim_runtime::{SinkError, StatusSink, StatusUpdate};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

#[derive(Clone, Debug)]
struct Assignment {
    floor_id: FloorId,
    lift_id: LiftId,
    #[allow(dead_code)]
    floor_number: u32,
}

#[derive(Default)]
struct Store {
    system: Option<System>,
    lifts: Vec<Lift>,
    floors: Vec<Floor>,
    assignments: Vec<Assignment>,
}

/// In-memory repository for tests (and for running the server without a
/// database). All operations are atomic behind one `RwLock`, matching the
/// per-row atomicity the port promises.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
    /// When set, every write fails with `Storage`. Lets tests exercise the
    /// log-and-continue path of the movement orchestrator.
    fail_writes: Mutex<bool>,
}

impl InMemoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle write failures.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().expect("fail flag poisoned") = fail;
    }

    fn write_guard(&self) -> Result<(), RepositoryError> {
        if *self.fail_writes.lock().expect("fail flag poisoned") {
            return Err(RepositoryError::Storage("injected write failure".into()));
        }
        Ok(())
    }

    /// Number of assignment rows across all floors.
    #[must_use]
    pub fn assignment_count(&self) -> usize {
        self.store.read().expect("store poisoned").assignments.len()
    }

    /// Synchronous snapshot of one lift, for polling assertions.
    #[must_use]
    pub fn lift(&self, id: LiftId) -> Option<Lift> {
        self.store
            .read()
            .expect("store poisoned")
            .lifts
            .iter()
            .find(|lift| lift.id == id)
            .cloned()
    }

    /// Synchronous snapshot of every lift, in creation order.
    #[must_use]
    pub fn lifts_snapshot(&self) -> Vec<Lift> {
        self.store.read().expect("store poisoned").lifts.clone()
    }

    /// Synchronous snapshot of one floor, for polling assertions.
    #[must_use]
    pub fn floor_by_number(&self, number: u32) -> Option<Floor> {
        self.store
            .read()
            .expect("store poisoned")
            .floors
            .iter()
            .find(|floor| floor.number == number)
            .cloned()
    }

    /// Floors a lift is currently assigned to.
    #[must_use]
    pub fn floors_assigned_to(&self, lift_id: LiftId) -> Vec<FloorId> {
        self.store
            .read()
            .expect("store poisoned")
            .assignments
            .iter()
            .filter(|a| a.lift_id == lift_id)
            .map(|a| a.floor_id)
            .collect()
    }
}

impl Repository for InMemoryRepository {
    fn get_system(&self) -> BoxFuture<'_, Result<System, RepositoryError>> {
        Box::pin(async move {
            self.store
                .read()
                .expect("store poisoned")
                .system
                .ok_or_else(|| RepositoryError::not_found("system", "current"))
        })
    }

    fn save_system(&self, system: System) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            self.store.write().expect("store poisoned").system = Some(system);
            Ok(())
        })
    }

    fn update_system(&self, system: System) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            if store.system.is_none() {
                return Err(RepositoryError::not_found("system", "current"));
            }
            store.system = Some(system);
            Ok(())
        })
    }

    fn get_lift(&self, id: LiftId) -> BoxFuture<'_, Result<Lift, RepositoryError>> {
        Box::pin(async move {
            self.store
                .read()
                .expect("store poisoned")
                .lifts
                .iter()
                .find(|lift| lift.id == id)
                .cloned()
                .ok_or_else(|| RepositoryError::not_found("lift", id))
        })
    }

    fn list_lifts(&self) -> BoxFuture<'_, Result<Vec<Lift>, RepositoryError>> {
        Box::pin(async move { Ok(self.store.read().expect("store poisoned").lifts.clone()) })
    }

    fn save_lift(&self, lift: Lift) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            if store.lifts.iter().any(|existing| existing.name == lift.name) {
                return Err(RepositoryError::Conflict(format!(
                    "lift name {} already exists",
                    lift.name
                )));
            }
            store.lifts.push(lift);
            Ok(())
        })
    }

    fn update_lift(&self, lift: Lift) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            let slot = store
                .lifts
                .iter_mut()
                .find(|existing| existing.id == lift.id)
                .ok_or_else(|| RepositoryError::not_found("lift", lift.id))?;
            *slot = lift;
            Ok(())
        })
    }

    fn delete_lift(&self, id: LiftId) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            let before = store.lifts.len();
            store.lifts.retain(|lift| lift.id != id);
            if store.lifts.len() == before {
                return Err(RepositoryError::not_found("lift", id));
            }
            store.assignments.retain(|a| a.lift_id != id);
            Ok(())
        })
    }

    fn get_floor(&self, id: FloorId) -> BoxFuture<'_, Result<Floor, RepositoryError>> {
        Box::pin(async move {
            self.store
                .read()
                .expect("store poisoned")
                .floors
                .iter()
                .find(|floor| floor.id == id)
                .cloned()
                .ok_or_else(|| RepositoryError::not_found("floor", id))
        })
    }

    fn get_floor_by_number(&self, number: u32) -> BoxFuture<'_, Result<Floor, RepositoryError>> {
        Box::pin(async move {
            self.store
                .read()
                .expect("store poisoned")
                .floors
                .iter()
                .find(|floor| floor.number == number)
                .cloned()
                .ok_or_else(|| RepositoryError::not_found("floor", number))
        })
    }

    fn list_floors(&self) -> BoxFuture<'_, Result<Vec<Floor>, RepositoryError>> {
        Box::pin(async move { Ok(self.store.read().expect("store poisoned").floors.clone()) })
    }

    fn save_floor(&self, floor: Floor) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            if store
                .floors
                .iter()
                .any(|existing| existing.number == floor.number)
            {
                return Err(RepositoryError::Conflict(format!(
                    "floor {} already exists",
                    floor.number
                )));
            }
            store.floors.push(floor);
            Ok(())
        })
    }

    fn update_floor(&self, floor: Floor) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            let slot = store
                .floors
                .iter_mut()
                .find(|existing| existing.id == floor.id)
                .ok_or_else(|| RepositoryError::not_found("floor", floor.id))?;
            *slot = floor;
            Ok(())
        })
    }

    fn assign_lift_to_floor(
        &self,
        floor_id: FloorId,
        lift_id: LiftId,
        floor_number: u32,
    ) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            let already = store
                .assignments
                .iter()
                .any(|a| a.floor_id == floor_id && a.lift_id == lift_id);
            if !already {
                store.assignments.push(Assignment {
                    floor_id,
                    lift_id,
                    floor_number,
                });
            }
            Ok(())
        })
    }

    fn unassign_lift_from_floor(
        &self,
        floor_id: FloorId,
        lift_id: LiftId,
    ) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            store
                .assignments
                .retain(|a| !(a.floor_id == floor_id && a.lift_id == lift_id));
            Ok(())
        })
    }

    fn assigned_lifts_for_floor(
        &self,
        floor_id: FloorId,
    ) -> BoxFuture<'_, Result<Vec<Lift>, RepositoryError>> {
        Box::pin(async move {
            let store = self.store.read().expect("store poisoned");
            Ok(store
                .assignments
                .iter()
                .filter(|a| a.floor_id == floor_id)
                .filter_map(|a| store.lifts.iter().find(|lift| lift.id == a.lift_id))
                .cloned()
                .collect())
        })
    }

    fn clear_all_assignments(&self) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            self.store
                .write()
                .expect("store poisoned")
                .assignments
                .clear();
            Ok(())
        })
    }

    fn clear_all(&self) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.write_guard()?;
            let mut store = self.store.write().expect("store poisoned");
            *store = Store::default();
            Ok(())
        })
    }
}

/// A [`StatusSink`] that records everything delivered to it.
#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<StatusUpdate>>,
    closed: Mutex<bool>,
    /// When set, every send fails, for exercising unregister-on-failure.
    fail_sends: Mutex<bool>,
}

impl RecordingSink {
    /// Create a sink that accepts everything.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the updates received so far.
    #[must_use]
    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().expect("sink poisoned").clone()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.lock().expect("sink poisoned")
    }

    /// Make subsequent sends fail.
    pub fn set_fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().expect("sink poisoned") = fail;
    }
}

impl StatusSink for RecordingSink {
    fn send(&self, update: StatusUpdate) -> BoxFuture<'_, Result<(), SinkError>> {
        Box::pin(async move {
            if *self.fail_sends.lock().expect("sink poisoned") {
                return Err(SinkError::Write("injected send failure".into()));
            }
            self.updates.lock().expect("sink poisoned").push(update);
            Ok(())
        })
    }

    fn close(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            *self.closed.lock().expect("sink poisoned") = true;
        })
    }
}

/// An [`EventHandler`] that records every event it sees. Subscribe it to the
/// kinds under test.
#[derive(Default)]
pub struct EventRecorder {
    events: Mutex<Vec<LiftEvent>>,
}

impl EventRecorder {
    /// Create a recorder.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<LiftEvent> {
        self.events.lock().expect("recorder poisoned").clone()
    }

    /// Recorded events of one kind.
    #[must_use]
    pub fn of_kind(&self, kind: EventKind) -> Vec<LiftEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.kind() == kind)
            .collect()
    }
}

impl EventHandler for EventRecorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn handle(&self, event: LiftEvent) -> BoxFuture<'static, Result<(), HandlerError>> {
        self.events.lock().expect("recorder poisoned").push(event);
        Box::pin(async move { Ok(()) })
    }
}

/// Poll `condition` every few milliseconds until it holds or `timeout`
/// elapses. Returns whether the condition was met.
///
/// The condition is synchronous; poll the test doubles' snapshot accessors
/// rather than the async ports.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
