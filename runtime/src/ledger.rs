//! The floor↔lift assignment ledger.
//!
//! A row exists while a lift is committed to serve (or is departing from) a
//! floor; the set of rows for one floor bounds that floor's congestion. The
//! ledger itself is a thin atomic facade over the repository; the
//! check-capacity-then-reserve sequence is made atomic by the dispatch
//! mutex, not here.

use liftsim_core::{FloorId, Lift, LiftId, Repository, RepositoryError};
use std::sync::Arc;
use tracing::debug;

/// Atomic assignment operations over the persistence collaborator.
pub struct AssignmentLedger {
    repo: Arc<dyn Repository>,
}

impl AssignmentLedger {
    /// Create a ledger over `repo`.
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Reserve (or re-assert) a slot binding `lift_id` to `floor_id`.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn assign(
        &self,
        floor_id: FloorId,
        lift_id: LiftId,
        floor_number: u32,
    ) -> Result<(), RepositoryError> {
        self.repo
            .assign_lift_to_floor(floor_id, lift_id, floor_number)
            .await?;
        debug!(%lift_id, %floor_id, floor = floor_number, "lift assigned to floor");
        Ok(())
    }

    /// Release the slot binding `lift_id` to `floor_id`, if held.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn unassign(&self, floor_id: FloorId, lift_id: LiftId) -> Result<(), RepositoryError> {
        self.repo.unassign_lift_from_floor(floor_id, lift_id).await?;
        debug!(%lift_id, %floor_id, "lift unassigned from floor");
        Ok(())
    }

    /// The lifts currently assigned to `floor_id`.
    ///
    /// Unordered reads may observe stale counts; callers enforcing the
    /// capacity cap must re-read under the dispatch mutex.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn list_for_floor(&self, floor_id: FloorId) -> Result<Vec<Lift>, RepositoryError> {
        self.repo.assigned_lifts_for_floor(floor_id).await
    }

    /// Drop every assignment row. Used by system reset.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn clear_all(&self) -> Result<(), RepositoryError> {
        self.repo.clear_all_assignments().await?;
        debug!("assignment ledger cleared");
        Ok(())
    }
}
