//! Persistence port.
//!
//! The repository owns every persistent entity; the dispatch engine only
//! holds transient copies for the duration of a dispatch. Each method is
//! atomic per row or assignment; multi-row consistency (the capacity
//! check-and-reserve) is provided by the dispatch mutex, never assumed of
//! the store.
//!
//! # Dyn Compatibility
//!
//! Methods return `BoxFuture` instead of using `async fn` so the trait can
//! be shared as `Arc<dyn Repository>` across dispatch, movement, and handler
//! tasks.

use crate::domain::{Floor, FloorId, Lift, LiftId, System};
use futures::future::BoxFuture;
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The requested row does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (`"system"`, `"lift"`, `"floor"`).
        entity: &'static str,
        /// Identifier used in the lookup.
        id: String,
    },

    /// A uniqueness constraint was violated (e.g. a duplicate lift name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("storage: {0}")]
    Storage(String),
}

impl RepositoryError {
    /// Shorthand for a [`RepositoryError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this error is a missing row rather than a store failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for repository results.
pub type RepoResult<'a, T> = BoxFuture<'a, Result<T, RepositoryError>>;

/// The persistence port.
///
/// `list_lifts` and `list_floors` return entities in creation order; the
/// dispatch tie-break ("first scanned wins") depends on deterministic
/// iteration.
pub trait Repository: Send + Sync {
    // ------------------------------------------------------------------
    // System
    // ------------------------------------------------------------------

    /// Fetch the current system configuration.
    fn get_system(&self) -> RepoResult<'_, System>;

    /// Store a new system configuration.
    fn save_system(&self, system: System) -> RepoResult<'_, ()>;

    /// Update the existing system configuration.
    fn update_system(&self, system: System) -> RepoResult<'_, ()>;

    // ------------------------------------------------------------------
    // Lifts
    // ------------------------------------------------------------------

    /// Fetch one lift by id.
    fn get_lift(&self, id: LiftId) -> RepoResult<'_, Lift>;

    /// All lifts, in creation order.
    fn list_lifts(&self) -> RepoResult<'_, Vec<Lift>>;

    /// Store a new lift. Names are unique.
    fn save_lift(&self, lift: Lift) -> RepoResult<'_, ()>;

    /// Update an existing lift.
    fn update_lift(&self, lift: Lift) -> RepoResult<'_, ()>;

    /// Remove a lift.
    fn delete_lift(&self, id: LiftId) -> RepoResult<'_, ()>;

    // ------------------------------------------------------------------
    // Floors
    // ------------------------------------------------------------------

    /// Fetch one floor by id.
    fn get_floor(&self, id: FloorId) -> RepoResult<'_, Floor>;

    /// Fetch one floor by its dense number.
    fn get_floor_by_number(&self, number: u32) -> RepoResult<'_, Floor>;

    /// All floors, in creation order.
    fn list_floors(&self) -> RepoResult<'_, Vec<Floor>>;

    /// Store a new floor. Numbers are unique.
    fn save_floor(&self, floor: Floor) -> RepoResult<'_, ()>;

    /// Update an existing floor.
    fn update_floor(&self, floor: Floor) -> RepoResult<'_, ()>;

    // ------------------------------------------------------------------
    // Assignments
    // ------------------------------------------------------------------

    /// Bind `lift_id` to `floor_id` (upsert; re-assigning is a no-op).
    fn assign_lift_to_floor(
        &self,
        floor_id: FloorId,
        lift_id: LiftId,
        floor_number: u32,
    ) -> RepoResult<'_, ()>;

    /// Remove the binding between `lift_id` and `floor_id`, if present.
    fn unassign_lift_from_floor(&self, floor_id: FloorId, lift_id: LiftId) -> RepoResult<'_, ()>;

    /// The lifts currently assigned to `floor_id`.
    fn assigned_lifts_for_floor(&self, floor_id: FloorId) -> RepoResult<'_, Vec<Lift>>;

    /// Drop every assignment row.
    fn clear_all_assignments(&self) -> RepoResult<'_, ()>;

    // ------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------

    /// Wipe the system, lifts, floors, and assignments. `Configure` uses
    /// this to implement replace semantics.
    fn clear_all(&self) -> RepoResult<'_, ()>;
}
