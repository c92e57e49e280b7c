//! SQLite repository for the lift simulation.
//!
//! Implements the [`Repository`] port over a `SqlitePool`. The schema is
//! created on startup with idempotent DDL; every port method is a single
//! statement (or a short statement sequence on one connection), matching the
//! per-row atomicity the port promises. Multi-row consistency is the
//! dispatch mutex's job, not the database's.
//!
//! Enums are stored as their integer encodings, uuids as text, timestamps as
//! RFC 3339 text. `list_*` queries order by `rowid`, i.e. creation order;
//! the dispatch tie-break depends on it.

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use liftsim_core::{
    Direction, Floor, FloorId, Lift, LiftId, LiftStatus, Repository, RepositoryError, System,
    SystemId,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS systems (
    id            TEXT PRIMARY KEY,
    total_floors  INTEGER NOT NULL,
    total_lifts   INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS lifts (
    id             TEXT PRIMARY KEY,
    name           TEXT NOT NULL UNIQUE,
    current_floor  INTEGER NOT NULL,
    target_floor   INTEGER NOT NULL,
    direction      INTEGER NOT NULL,
    status         INTEGER NOT NULL,
    capacity       INTEGER NOT NULL,
    passengers     INTEGER NOT NULL,
    last_moved_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS floors (
    id         TEXT PRIMARY KEY,
    number     INTEGER NOT NULL UNIQUE,
    up_call    INTEGER NOT NULL DEFAULT 0,
    down_call  INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS lift_assignments (
    floor_id      TEXT NOT NULL,
    lift_id       TEXT NOT NULL,
    floor_number  INTEGER NOT NULL,
    PRIMARY KEY (floor_id, lift_id)
);
";

/// SQLite-backed implementation of the repository port.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Storage`] when the file cannot be opened or the
    /// DDL fails.
    pub async fn new(path: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
            .map_err(|e| RepositoryError::Storage(e.to_string()))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(map_sqlx)?;
        let repo = Self { pool };
        repo.init_schema().await?;
        info!(path, "sqlite repository ready");
        Ok(repo)
    }

    /// An in-memory database for tests. Pinned to a single pooled
    /// connection, since every SQLite `:memory:` connection is its own
    /// database.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Storage`] when the DDL fails.
    pub async fn in_memory() -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect_with(options)
            .await
            .map_err(map_sqlx)?;
        let repo = Self { pool };
        repo.init_schema().await?;
        Ok(repo)
    }

    async fn init_schema(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

fn map_sqlx(error: sqlx::Error) -> RepositoryError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_string())
        }
        _ => RepositoryError::Storage(error.to_string()),
    }
}

fn bad_row(context: &str, detail: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(format!("corrupt {context} row: {detail}"))
}

fn system_from_row(row: &SqliteRow) -> Result<System, RepositoryError> {
    let id: String = row.try_get("id").map_err(map_sqlx)?;
    let total_floors: i64 = row.try_get("total_floors").map_err(map_sqlx)?;
    let total_lifts: i64 = row.try_get("total_lifts").map_err(map_sqlx)?;
    let id = SystemId::from_str(&id).map_err(|e| bad_row("system", e))?;
    System::new(id, total_floors as u32, total_lifts as u32).map_err(|e| bad_row("system", e))
}

fn lift_from_row(row: &SqliteRow) -> Result<Lift, RepositoryError> {
    let id: String = row.try_get("id").map_err(map_sqlx)?;
    let name: String = row.try_get("name").map_err(map_sqlx)?;
    let current_floor: i64 = row.try_get("current_floor").map_err(map_sqlx)?;
    let target_floor: i64 = row.try_get("target_floor").map_err(map_sqlx)?;
    let direction: i64 = row.try_get("direction").map_err(map_sqlx)?;
    let status: i64 = row.try_get("status").map_err(map_sqlx)?;
    let capacity: i64 = row.try_get("capacity").map_err(map_sqlx)?;
    let passengers: i64 = row.try_get("passengers").map_err(map_sqlx)?;
    let last_moved_at: String = row.try_get("last_moved_at").map_err(map_sqlx)?;

    Ok(Lift {
        id: LiftId::from_str(&id).map_err(|e| bad_row("lift", e))?,
        name,
        current_floor: current_floor as u32,
        target_floor: target_floor as u32,
        direction: Direction::try_from(direction as u8).map_err(|e| bad_row("lift", e))?,
        status: LiftStatus::try_from(status as u8).map_err(|e| bad_row("lift", e))?,
        capacity: capacity as u32,
        passengers: passengers as u32,
        last_moved_at: DateTime::parse_from_rfc3339(&last_moved_at)
            .map_err(|e| bad_row("lift", e))?
            .with_timezone(&Utc),
    })
}

fn floor_from_row(row: &SqliteRow) -> Result<Floor, RepositoryError> {
    let id: String = row.try_get("id").map_err(map_sqlx)?;
    let number: i64 = row.try_get("number").map_err(map_sqlx)?;
    let up_call: i64 = row.try_get("up_call").map_err(map_sqlx)?;
    let down_call: i64 = row.try_get("down_call").map_err(map_sqlx)?;

    Ok(Floor {
        id: FloorId::from_str(&id).map_err(|e| bad_row("floor", e))?,
        number: number as u32,
        up_call: up_call != 0,
        down_call: down_call != 0,
    })
}

impl Repository for SqliteRepository {
    fn get_system(&self) -> BoxFuture<'_, Result<System, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query("SELECT id, total_floors, total_lifts FROM systems LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?
                .ok_or_else(|| RepositoryError::not_found("system", "current"))?;
            system_from_row(&row)
        })
    }

    fn save_system(&self, system: System) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            sqlx::query("INSERT INTO systems (id, total_floors, total_lifts) VALUES (?, ?, ?)")
                .bind(system.id.to_string())
                .bind(i64::from(system.total_floors))
                .bind(i64::from(system.total_lifts))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn update_system(&self, system: System) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            let result =
                sqlx::query("UPDATE systems SET total_floors = ?, total_lifts = ? WHERE id = ?")
                    .bind(i64::from(system.total_floors))
                    .bind(i64::from(system.total_lifts))
                    .bind(system.id.to_string())
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx)?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::not_found("system", system.id));
            }
            Ok(())
        })
    }

    fn get_lift(&self, id: LiftId) -> BoxFuture<'_, Result<Lift, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query("SELECT * FROM lifts WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?
                .ok_or_else(|| RepositoryError::not_found("lift", id))?;
            lift_from_row(&row)
        })
    }

    fn list_lifts(&self) -> BoxFuture<'_, Result<Vec<Lift>, RepositoryError>> {
        Box::pin(async move {
            let rows = sqlx::query("SELECT * FROM lifts ORDER BY rowid")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?;
            rows.iter().map(lift_from_row).collect()
        })
    }

    fn save_lift(&self, lift: Lift) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO lifts \
                 (id, name, current_floor, target_floor, direction, status, capacity, passengers, last_moved_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(lift.id.to_string())
            .bind(&lift.name)
            .bind(i64::from(lift.current_floor))
            .bind(i64::from(lift.target_floor))
            .bind(i64::from(u8::from(lift.direction)))
            .bind(i64::from(u8::from(lift.status)))
            .bind(i64::from(lift.capacity))
            .bind(i64::from(lift.passengers))
            .bind(lift.last_moved_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn update_lift(&self, lift: Lift) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE lifts SET name = ?, current_floor = ?, target_floor = ?, direction = ?, \
                 status = ?, capacity = ?, passengers = ?, last_moved_at = ? WHERE id = ?",
            )
            .bind(&lift.name)
            .bind(i64::from(lift.current_floor))
            .bind(i64::from(lift.target_floor))
            .bind(i64::from(u8::from(lift.direction)))
            .bind(i64::from(u8::from(lift.status)))
            .bind(i64::from(lift.capacity))
            .bind(i64::from(lift.passengers))
            .bind(lift.last_moved_at.to_rfc3339())
            .bind(lift.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::not_found("lift", lift.id));
            }
            Ok(())
        })
    }

    fn delete_lift(&self, id: LiftId) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM lifts WHERE id = ?")
                .bind(id.to_string())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::not_found("lift", id));
            }
            sqlx::query("DELETE FROM lift_assignments WHERE lift_id = ?")
                .bind(id.to_string())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn get_floor(&self, id: FloorId) -> BoxFuture<'_, Result<Floor, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query("SELECT * FROM floors WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?
                .ok_or_else(|| RepositoryError::not_found("floor", id))?;
            floor_from_row(&row)
        })
    }

    fn get_floor_by_number(&self, number: u32) -> BoxFuture<'_, Result<Floor, RepositoryError>> {
        Box::pin(async move {
            let row = sqlx::query("SELECT * FROM floors WHERE number = ?")
                .bind(i64::from(number))
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx)?
                .ok_or_else(|| RepositoryError::not_found("floor", number))?;
            floor_from_row(&row)
        })
    }

    fn list_floors(&self) -> BoxFuture<'_, Result<Vec<Floor>, RepositoryError>> {
        Box::pin(async move {
            let rows = sqlx::query("SELECT * FROM floors ORDER BY rowid")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)?;
            rows.iter().map(floor_from_row).collect()
        })
    }

    fn save_floor(&self, floor: Floor) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            sqlx::query("INSERT INTO floors (id, number, up_call, down_call) VALUES (?, ?, ?, ?)")
                .bind(floor.id.to_string())
                .bind(i64::from(floor.number))
                .bind(i64::from(floor.up_call))
                .bind(i64::from(floor.down_call))
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn update_floor(&self, floor: Floor) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            let result =
                sqlx::query("UPDATE floors SET number = ?, up_call = ?, down_call = ? WHERE id = ?")
                    .bind(i64::from(floor.number))
                    .bind(i64::from(floor.up_call))
                    .bind(i64::from(floor.down_call))
                    .bind(floor.id.to_string())
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx)?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::not_found("floor", floor.id));
            }
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
            sqlx::query(
                "INSERT INTO lift_assignments (floor_id, lift_id, floor_number) VALUES (?, ?, ?) \
                 ON CONFLICT (floor_id, lift_id) DO UPDATE SET floor_number = excluded.floor_number",
            )
            .bind(floor_id.to_string())
            .bind(lift_id.to_string())
            .bind(i64::from(floor_number))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn unassign_lift_from_floor(
        &self,
        floor_id: FloorId,
        lift_id: LiftId,
    ) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            sqlx::query("DELETE FROM lift_assignments WHERE floor_id = ? AND lift_id = ?")
                .bind(floor_id.to_string())
                .bind(lift_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn assigned_lifts_for_floor(
        &self,
        floor_id: FloorId,
    ) -> BoxFuture<'_, Result<Vec<Lift>, RepositoryError>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT lifts.* FROM lifts \
                 JOIN lift_assignments ON lift_assignments.lift_id = lifts.id \
                 WHERE lift_assignments.floor_id = ? ORDER BY lifts.rowid",
            )
            .bind(floor_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
            rows.iter().map(lift_from_row).collect()
        })
    }

    fn clear_all_assignments(&self) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            sqlx::query("DELETE FROM lift_assignments")
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
            Ok(())
        })
    }

    fn clear_all(&self) -> BoxFuture<'_, Result<(), RepositoryError>> {
        Box::pin(async move {
            sqlx::raw_sql(
                "DELETE FROM lift_assignments; \
                 DELETE FROM lifts; \
                 DELETE FROM floors; \
                 DELETE FROM systems;",
            )
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
            Ok(())
        })
    }
}
