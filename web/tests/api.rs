//! Handler-level API tests over an in-memory runtime.
//!
//! Handlers are plain async functions of their extractors, so they can be
//! driven directly without a TCP listener.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use liftsim_core::{EventBus, InMemoryEventBus, Repository};
use liftsim_runtime::{LiftRuntime, RuntimeConfig, TripTiming};
use liftsim_testing::{wait_until, InMemoryRepository};
use liftsim_web::handlers::{floors, lifts, system};
use liftsim_web::AppState;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn state() -> (Arc<InMemoryRepository>, LiftRuntime, AppState) {
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
    let state = AppState::new(
        Arc::clone(&runtime.dispatcher),
        Arc::clone(&runtime.system),
        Arc::clone(&runtime.broadcaster),
    );
    (repo, runtime, state)
}

#[tokio::test(flavor = "multi_thread")]
async fn configure_then_query() {
    let (_repo, _runtime, state) = state();

    let Json(configured) = system::configure(
        State(state.clone()),
        Json(system::ConfigureRequest { floors: 5, lifts: 2 }),
    )
    .await
    .expect("configure");
    assert_eq!(configured.total_floors, 5);
    assert_eq!(configured.total_lifts, 2);

    let Json(lift_list) = lifts::list(State(state.clone())).await.expect("list");
    assert_eq!(lift_list.len(), 2);
    assert_eq!(lift_list[0].name, "L1");

    let Json(floor_list) = floors::list(State(state.clone())).await.expect("list");
    assert_eq!(floor_list.len(), 5);

    let Json(metrics) = system::metrics(State(state)).await.expect("metrics");
    assert_eq!(metrics.available_lifts, 2);
    assert_eq!(metrics.completed_trips, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_configure_is_bad_request() {
    let (_repo, _runtime, state) = state();

    let error = system::configure(
        State(state),
        Json(system::ConfigureRequest { floors: 1, lifts: 1 }),
    )
    .await
    .expect_err("must reject");
    assert_eq!(error.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn queries_before_configure_are_not_found() {
    let (_repo, _runtime, state) = state();

    let error = system::configuration(State(state.clone()))
        .await
        .expect_err("unconfigured");
    assert_eq!(error.status(), StatusCode::NOT_FOUND);

    let error = floors::call(
        State(state),
        Path(2),
        Json(floors::CallRequest { direction: 0 }),
    )
    .await
    .expect_err("no floors yet");
    assert_eq!(error.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn call_validates_direction_and_floor() {
    let (_repo, _runtime, state) = state();
    system::configure(
        State(state.clone()),
        Json(system::ConfigureRequest { floors: 5, lifts: 2 }),
    )
    .await
    .expect("configure");

    let error = floors::call(
        State(state.clone()),
        Path(2),
        Json(floors::CallRequest { direction: 7 }),
    )
    .await
    .expect_err("bad direction");
    assert_eq!(error.status(), StatusCode::BAD_REQUEST);

    let error = floors::call(
        State(state.clone()),
        Path(9),
        Json(floors::CallRequest { direction: 0 }),
    )
    .await
    .expect_err("bad floor");
    assert_eq!(error.status(), StatusCode::NOT_FOUND);

    let (status, _) = floors::call(
        State(state),
        Path(2),
        Json(floors::CallRequest { direction: 0 }),
    )
    .await
    .expect("accepted");
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test(flavor = "multi_thread")]
async fn move_rejects_same_floor_with_bad_request() {
    let (repo, _runtime, state) = state();
    system::configure(
        State(state.clone()),
        Json(system::ConfigureRequest { floors: 5, lifts: 1 }),
    )
    .await
    .expect("configure");
    let lift = repo.lifts_snapshot()[0].clone();

    let (status, _) = lifts::move_lift(
        State(state.clone()),
        Path(lift.id.to_string()),
        Json(lifts::MoveRequest { target_floor: 1 }),
    )
    .await
    .expect("accepted");
    assert_eq!(status, StatusCode::ACCEPTED);

    assert!(
        wait_until(WAIT, || {
            repo.lift(lift.id)
                .is_some_and(|l| l.current_floor == 1 && l.is_available())
        })
        .await
    );

    let error = lifts::move_lift(
        State(state),
        Path(lift.id.to_string()),
        Json(lifts::MoveRequest { target_floor: 1 }),
    )
    .await
    .expect_err("already there");
    assert_eq!(error.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_lift_is_not_found() {
    let (_repo, _runtime, state) = state();
    system::configure(
        State(state.clone()),
        Json(system::ConfigureRequest { floors: 5, lifts: 1 }),
    )
    .await
    .expect("configure");

    let error = lifts::get(
        State(state.clone()),
        Path(liftsim_core::LiftId::new().to_string()),
    )
    .await
    .expect_err("unknown lift");
    assert_eq!(error.status(), StatusCode::NOT_FOUND);

    let error = lifts::get(State(state), Path("not-a-uuid".to_string()))
        .await
        .expect_err("malformed id");
    assert_eq!(error.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn set_status_accepts_labels() {
    let (repo, _runtime, state) = state();
    system::configure(
        State(state.clone()),
        Json(system::ConfigureRequest { floors: 5, lifts: 1 }),
    )
    .await
    .expect("configure");
    let lift = repo.lifts_snapshot()[0].clone();

    let Json(updated) = lifts::set_status(
        State(state.clone()),
        Path(lift.id.to_string()),
        Json(lifts::SetStatusRequest {
            status: "OutOfService".to_string(),
        }),
    )
    .await
    .expect("set status");
    assert_eq!(updated.status, liftsim_core::LiftStatus::OutOfService);

    let error = lifts::set_status(
        State(state),
        Path(lift.id.to_string()),
        Json(lifts::SetStatusRequest {
            status: "Broken".to_string(),
        }),
    )
    .await
    .expect_err("bad label");
    assert_eq!(error.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn active_calls_track_button_state() {
    let (repo, _runtime, state) = state();
    system::configure(
        State(state.clone()),
        Json(system::ConfigureRequest { floors: 6, lifts: 2 }),
    )
    .await
    .expect("configure");

    let Json(none) = floors::active_calls(State(state.clone()))
        .await
        .expect("calls");
    assert!(none.is_empty());

    floors::call(
        State(state.clone()),
        Path(4),
        Json(floors::CallRequest { direction: 1 }),
    )
    .await
    .expect("accepted");

    // The press is visible until the trip's arrival clears it.
    let Json(active) = floors::active_calls(State(state.clone()))
        .await
        .expect("calls");
    assert_eq!(active, vec![4]);

    assert!(
        wait_until(WAIT, || {
            repo.floor_by_number(4).is_some_and(|f| !f.has_active_call())
        })
        .await,
        "arrival clears the active call"
    );
}
