//! Repository contract tests against an in-memory SQLite database.

use liftsim_core::{
    Direction, Floor, FloorId, Lift, LiftId, LiftStatus, Repository, RepositoryError, System,
    SystemId,
};
use liftsim_sqlite::SqliteRepository;

async fn repo() -> SqliteRepository {
    SqliteRepository::in_memory().await.expect("open db")
}

#[tokio::test]
async fn system_round_trip() {
    let repo = repo().await;

    let missing = repo.get_system().await;
    assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));

    let system = System::new(SystemId::new(), 8, 3).expect("system");
    repo.save_system(system).await.expect("save");
    assert_eq!(repo.get_system().await.expect("get"), system);

    let grown = System::new(system.id, 8, 4).expect("system");
    repo.update_system(grown).await.expect("update");
    assert_eq!(repo.get_system().await.expect("get").total_lifts, 4);

    let phantom = System::new(SystemId::new(), 5, 2).expect("system");
    assert!(matches!(
        repo.update_system(phantom).await,
        Err(RepositoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn lift_round_trip_preserves_state() {
    let repo = repo().await;

    let mut lift = Lift::new(LiftId::new(), "L1");
    repo.save_lift(lift.clone()).await.expect("save");

    lift.begin_trip(4).expect("trip");
    lift.advance_to(2);
    lift.board(3).expect("board");
    repo.update_lift(lift.clone()).await.expect("update");

    let loaded = repo.get_lift(lift.id).await.expect("get");
    assert_eq!(loaded.current_floor, 2);
    assert_eq!(loaded.target_floor, 4);
    assert_eq!(loaded.direction, Direction::Up);
    assert_eq!(loaded.status, LiftStatus::Occupied);
    assert_eq!(loaded.passengers, 3);
}

#[tokio::test]
async fn lift_names_are_unique() {
    let repo = repo().await;

    repo.save_lift(Lift::new(LiftId::new(), "L1")).await.expect("save");
    let duplicate = repo.save_lift(Lift::new(LiftId::new(), "L1")).await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
async fn lists_keep_creation_order() {
    let repo = repo().await;

    for name in ["L1", "L2", "L3"] {
        repo.save_lift(Lift::new(LiftId::new(), name)).await.expect("save");
    }
    for number in 0..3 {
        repo.save_floor(Floor::new(FloorId::new(), number)).await.expect("save");
    }

    let names: Vec<_> = repo
        .list_lifts()
        .await
        .expect("lifts")
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["L1", "L2", "L3"]);

    let numbers: Vec<_> = repo
        .list_floors()
        .await
        .expect("floors")
        .into_iter()
        .map(|f| f.number)
        .collect();
    assert_eq!(numbers, vec![0, 1, 2]);
}

#[tokio::test]
async fn floor_buttons_persist() {
    let repo = repo().await;

    let mut floor = Floor::new(FloorId::new(), 5);
    repo.save_floor(floor.clone()).await.expect("save");

    floor.press_button(Direction::Down).expect("press");
    repo.update_floor(floor.clone()).await.expect("update");

    let loaded = repo.get_floor_by_number(5).await.expect("get");
    assert!(loaded.down_call);
    assert!(!loaded.up_call);
    assert_eq!(loaded.id, floor.id);

    assert!(matches!(
        repo.get_floor_by_number(9).await,
        Err(RepositoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn assignments_upsert_and_release() {
    let repo = repo().await;

    let floor = Floor::new(FloorId::new(), 2);
    let lift_a = Lift::new(LiftId::new(), "L1");
    let lift_b = Lift::new(LiftId::new(), "L2");
    repo.save_floor(floor.clone()).await.expect("save");
    repo.save_lift(lift_a.clone()).await.expect("save");
    repo.save_lift(lift_b.clone()).await.expect("save");

    repo.assign_lift_to_floor(floor.id, lift_a.id, 2).await.expect("assign");
    // Re-asserting the same binding is a no-op, not a second row.
    repo.assign_lift_to_floor(floor.id, lift_a.id, 2).await.expect("assign");
    repo.assign_lift_to_floor(floor.id, lift_b.id, 2).await.expect("assign");

    let assigned = repo.assigned_lifts_for_floor(floor.id).await.expect("assigned");
    assert_eq!(assigned.len(), 2);
    assert_eq!(assigned[0].name, "L1");

    repo.unassign_lift_from_floor(floor.id, lift_a.id).await.expect("unassign");
    let assigned = repo.assigned_lifts_for_floor(floor.id).await.expect("assigned");
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].name, "L2");

    repo.clear_all_assignments().await.expect("clear");
    assert!(repo
        .assigned_lifts_for_floor(floor.id)
        .await
        .expect("assigned")
        .is_empty());
}

#[tokio::test]
async fn delete_lift_removes_its_assignments() {
    let repo = repo().await;

    let floor = Floor::new(FloorId::new(), 1);
    let lift = Lift::new(LiftId::new(), "L1");
    repo.save_floor(floor.clone()).await.expect("save");
    repo.save_lift(lift.clone()).await.expect("save");
    repo.assign_lift_to_floor(floor.id, lift.id, 1).await.expect("assign");

    repo.delete_lift(lift.id).await.expect("delete");
    assert!(matches!(
        repo.get_lift(lift.id).await,
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(repo
        .assigned_lifts_for_floor(floor.id)
        .await
        .expect("assigned")
        .is_empty());

    assert!(matches!(
        repo.delete_lift(lift.id).await,
        Err(RepositoryError::NotFound { .. })
    ));
}

#[tokio::test]
async fn clear_all_wipes_every_table() {
    let repo = repo().await;

    let system = System::new(SystemId::new(), 4, 2).expect("system");
    repo.save_system(system).await.expect("save");
    let floor = Floor::new(FloorId::new(), 0);
    let lift = Lift::new(LiftId::new(), "L1");
    repo.save_floor(floor.clone()).await.expect("save");
    repo.save_lift(lift.clone()).await.expect("save");
    repo.assign_lift_to_floor(floor.id, lift.id, 0).await.expect("assign");

    repo.clear_all().await.expect("clear");

    assert!(repo.get_system().await.is_err());
    assert!(repo.list_lifts().await.expect("lifts").is_empty());
    assert!(repo.list_floors().await.expect("floors").is_empty());
    assert!(repo
        .assigned_lifts_for_floor(floor.id)
        .await
        .expect("assigned")
        .is_empty());
}
