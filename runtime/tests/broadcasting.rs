//! Status broadcaster behaviour: topic filtering, subscriber isolation, and
//! the end-to-end status stream over a real trip.

use liftsim_core::{Direction, EventBus, InMemoryEventBus, Repository};
use liftsim_runtime::{
    LiftRuntime, RuntimeConfig, StatusBroadcaster, StatusUpdate, TopicKind, TripTiming,
};
use liftsim_testing::{wait_until, InMemoryRepository, RecordingSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(2);

fn standalone_broadcaster(depth: usize) -> (Arc<StatusBroadcaster>, watch::Sender<bool>) {
    let (broadcaster, runner) = StatusBroadcaster::new(depth);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(runner.run(shutdown_rx));
    (broadcaster, shutdown_tx)
}

#[tokio::test(flavor = "multi_thread")]
async fn updates_reach_only_matching_topics() {
    let (broadcaster, _shutdown) = standalone_broadcaster(16);

    let floor_sink = RecordingSink::new();
    let lift_sink = RecordingSink::new();
    let floor_sub = broadcaster.register(floor_sink.clone());
    let lift_sub = broadcaster.register(lift_sink.clone());
    broadcaster.subscribe_floor(floor_sub, 2);
    broadcaster.subscribe_lift(lift_sub, "L1-id");

    broadcaster
        .broadcast(StatusUpdate::floor(2, "lift_arrived:x"))
        .await;
    broadcaster
        .broadcast(StatusUpdate::floor(3, "lift_arrived:y"))
        .await;
    broadcaster
        .broadcast(StatusUpdate::lift("L1-id", "Occupied", Some(1)))
        .await;
    broadcaster
        .broadcast(StatusUpdate::lift("other", "Available", Some(0)))
        .await;

    assert!(
        wait_until(WAIT, || {
            floor_sink.updates().len() == 1 && lift_sink.updates().len() == 1
        })
        .await,
        "each sink sees exactly its topic"
    );
    assert_eq!(floor_sink.updates()[0].id, "2");
    assert_eq!(floor_sink.updates()[0].kind, TopicKind::Floor);
    assert_eq!(lift_sink.updates()[0].id, "L1-id");
}

#[tokio::test(flavor = "multi_thread")]
async fn one_subscriber_may_hold_a_floor_and_a_lift_topic() {
    let (broadcaster, _shutdown) = standalone_broadcaster(16);

    let sink = RecordingSink::new();
    let sub = broadcaster.register(sink.clone());
    broadcaster.subscribe_floor(sub, 1);
    broadcaster.subscribe_lift(sub, "lift-a");

    broadcaster
        .broadcast(StatusUpdate::floor(1, "lift_assigned:lift-a"))
        .await;
    broadcaster
        .broadcast(StatusUpdate::lift("lift-a", "Occupied", None))
        .await;

    assert!(
        wait_until(WAIT, || sink.updates().len() == 2).await,
        "both topics deliver to the same subscriber"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_subscriber_is_dropped_without_disturbing_the_rest() {
    let (broadcaster, _shutdown) = standalone_broadcaster(16);

    let healthy = RecordingSink::new();
    let broken = RecordingSink::new();
    broken.set_fail_sends(true);

    let healthy_sub = broadcaster.register(healthy.clone());
    let broken_sub = broadcaster.register(broken.clone());
    broadcaster.subscribe_floor(healthy_sub, 4);
    broadcaster.subscribe_floor(broken_sub, 4);
    assert_eq!(broadcaster.subscriber_count(), 2);

    broadcaster
        .broadcast(StatusUpdate::floor(4, "lift_arrived:z"))
        .await;

    assert!(
        wait_until(WAIT, || {
            broadcaster.subscriber_count() == 1 && broken.is_closed()
        })
        .await,
        "the failing subscriber is unregistered and closed"
    );
    assert!(
        wait_until(WAIT, || healthy.updates().len() == 1).await,
        "the healthy subscriber still receives the update"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unregister_closes_the_sink() {
    let (broadcaster, _shutdown) = standalone_broadcaster(16);

    let sink = RecordingSink::new();
    let sub = broadcaster.register(sink.clone());
    broadcaster.unregister(sub).await;

    assert!(sink.is_closed());
    assert_eq!(broadcaster.subscriber_count(), 0);
}

/// Two clients on different topics both observe one trip: the lift client
/// sees at least the assignment and the arrival, the floor client sees the
/// arrival. Neither blocks the other.
#[tokio::test(flavor = "multi_thread")]
async fn one_trip_feeds_both_floor_and_lift_subscribers() {
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
    runtime.system.configure(5, 3).await.expect("configure");
    let lift = repo.lifts_snapshot()[0].clone();

    let lift_client = RecordingSink::new();
    let floor_client = RecordingSink::new();
    let lift_sub = runtime.broadcaster.register(lift_client.clone());
    let floor_sub = runtime.broadcaster.register(floor_client.clone());
    runtime.broadcaster.subscribe_lift(lift_sub, lift.id);
    runtime.broadcaster.subscribe_floor(floor_sub, 2);

    runtime
        .dispatcher
        .call_lift(2, Direction::Up)
        .await
        .expect("call accepted");

    assert!(
        wait_until(WAIT, || {
            lift_client
                .updates()
                .iter()
                .any(|u| u.status == "Available" && u.current_floor == Some(2))
        })
        .await,
        "the lift client sees the arrival with the final floor"
    );
    let lift_updates = lift_client.updates();
    assert!(
        lift_updates.iter().any(|u| u.status == "Occupied"),
        "the lift client saw the assignment too: {lift_updates:?}"
    );

    assert!(
        wait_until(WAIT, || {
            floor_client
                .updates()
                .iter()
                .any(|u| u.status.starts_with("lift_arrived:"))
        })
        .await,
        "the floor client sees the arrival"
    );
    runtime.shutdown().await;
}
