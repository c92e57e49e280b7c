//! Concurrency tests for the dispatch engine.
//!
//! The capacity cap must hold for every interleaving: no burst of
//! simultaneous calls may push a floor past `max(2, ⌈lifts/10⌉)`
//! assignments, and overflow is reported out-of-band as `FloorAtCapacity`.

use liftsim_core::{Direction, EventBus, EventKind, InMemoryEventBus, LiftStatus, Repository};
use liftsim_runtime::{LiftRuntime, RuntimeConfig, TripTiming};
use liftsim_testing::{wait_until, EventRecorder, InMemoryRepository};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

async fn setup(
    floors: u32,
    lifts: u32,
) -> (Arc<InMemoryRepository>, Arc<InMemoryEventBus>, LiftRuntime) {
    let repo = Arc::new(InMemoryRepository::new());
    let bus = Arc::new(InMemoryEventBus::new());
    let runtime = LiftRuntime::new(
        Arc::clone(&repo) as Arc<dyn Repository>,
        Arc::clone(&bus) as Arc<dyn EventBus>,
        RuntimeConfig {
            timing: TripTiming::fast(),
            broadcast_depth: 64,
        },
    );
    runtime
        .system
        .configure(floors, lifts)
        .await
        .expect("configure");
    (repo, bus, runtime)
}

/// Five simultaneous calls to one floor with K = 2: exactly two trips
/// proceed, the other three are rejected at the cap.
#[tokio::test(flavor = "multi_thread")]
async fn burst_of_calls_respects_the_floor_cap() {
    let (repo, bus, runtime) = setup(10, 10).await;
    let recorder = EventRecorder::new();
    bus.subscribe(EventKind::FloorAtCapacity, recorder.clone());
    bus.subscribe(EventKind::LiftArrived, recorder.clone());

    let calls: Vec<_> = (0..5)
        .map(|_| {
            let dispatcher = Arc::clone(&runtime.dispatcher);
            tokio::spawn(async move { dispatcher.call_lift(3, Direction::Up).await })
        })
        .collect();
    for call in calls {
        call.await.expect("join").expect("call accepted");
    }

    // All five dispatch handlers have run once two trips completed and
    // three rejections are recorded.
    assert!(
        wait_until(WAIT, || {
            recorder.of_kind(EventKind::FloorAtCapacity).len() == 3
                && recorder.of_kind(EventKind::LiftArrived).len() == 2
        })
        .await,
        "expected 2 arrivals and 3 capacity rejections, got {:?}",
        recorder.events()
    );

    // The ledger never exceeded the cap: the two winners hold the floor's
    // slots.
    let floor = repo.floor_by_number(3).expect("floor");
    let assigned = repo
        .assigned_lifts_for_floor(floor.id)
        .await
        .expect("assigned");
    assert_eq!(assigned.len(), 2);

    assert_eq!(runtime.metrics.snapshot().capacity_rejections, 3);
    runtime.shutdown().await;
}

/// Two concurrent dispatches never commit the same lift: selection and
/// reservation are serialized by the dispatch mutex.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_calls_pick_distinct_lifts() {
    let (repo, _bus, runtime) = setup(6, 4).await;

    let first = {
        let dispatcher = Arc::clone(&runtime.dispatcher);
        tokio::spawn(async move { dispatcher.call_lift(4, Direction::Down).await })
    };
    let second = {
        let dispatcher = Arc::clone(&runtime.dispatcher);
        tokio::spawn(async move { dispatcher.call_lift(5, Direction::Down).await })
    };
    first.await.expect("join").expect("call");
    second.await.expect("join").expect("call");

    assert!(
        wait_until(WAIT, || {
            let lifts = repo.lifts_snapshot();
            let at_4 = lifts.iter().any(|l| l.current_floor == 4 && l.is_available());
            let at_5 = lifts.iter().any(|l| l.current_floor == 5 && l.is_available());
            at_4 && at_5
        })
        .await,
        "both floors should be served by different lifts"
    );
    runtime.shutdown().await;
}

/// A call with every lift busy produces no trip and no capacity event, just
/// a logged failure and a bumped counter.
#[tokio::test(flavor = "multi_thread")]
async fn call_with_no_available_lift_is_logged_not_published() {
    let (repo, bus, runtime) = setup(5, 3).await;
    let recorder = EventRecorder::new();
    bus.subscribe(EventKind::FloorAtCapacity, recorder.clone());
    bus.subscribe(EventKind::LiftArrived, recorder.clone());
    bus.subscribe(EventKind::LiftAssigned, recorder.clone());

    for mut lift in repo.lifts_snapshot() {
        lift.status = LiftStatus::Occupied;
        repo.update_lift(lift).await.expect("update");
    }

    runtime
        .dispatcher
        .call_lift(4, Direction::Up)
        .await
        .expect("call accepted");

    assert!(
        wait_until(WAIT, || {
            runtime.metrics.snapshot().failed_dispatches == 1
        })
        .await,
        "the failed dispatch should be counted"
    );
    assert!(recorder.events().is_empty(), "no event should be emitted");
    runtime.shutdown().await;
}

/// The selected lift is the nearest to the ground floor among available
/// ones.
#[tokio::test(flavor = "multi_thread")]
async fn dispatch_selects_nearest_to_ground() {
    let (repo, _bus, runtime) = setup(8, 3).await;

    // Park L1 high, L2 low, L3 in between.
    let mut lifts = repo.lifts_snapshot();
    lifts[0].current_floor = 6;
    lifts[1].current_floor = 1;
    lifts[2].current_floor = 3;
    for lift in &lifts {
        repo.update_lift(lift.clone()).await.expect("update");
    }
    let l2 = lifts[1].id;

    runtime
        .dispatcher
        .call_lift(7, Direction::Up)
        .await
        .expect("call accepted");

    assert!(
        wait_until(WAIT, || {
            repo.lift(l2)
                .is_some_and(|lift| lift.current_floor == 7 && lift.is_available())
        })
        .await,
        "L2 (nearest to ground) should have served the call"
    );
    runtime.shutdown().await;
}
