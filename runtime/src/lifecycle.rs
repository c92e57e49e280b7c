//! System lifecycle and operator maintenance.
//!
//! Configuration (with replace semantics), system reset, the aggregate
//! status/metrics views, and the small operator CRUD surface over lifts and
//! floors.

use crate::error::LifecycleError;
use crate::ledger::AssignmentLedger;
use crate::metrics::DispatchMetrics;
use liftsim_core::{
    EventBus, Floor, FloorId, Lift, LiftEvent, LiftId, LiftStatus, Repository, RepositoryError,
    System, SystemId, SystemMetrics, SystemStatus, TrafficIntensity,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle and maintenance operations.
pub struct SystemService {
    repo: Arc<dyn Repository>,
    bus: Arc<dyn EventBus>,
    ledger: Arc<AssignmentLedger>,
    metrics: Arc<DispatchMetrics>,
}

impl SystemService {
    /// Create the service.
    #[must_use]
    pub fn new(
        repo: Arc<dyn Repository>,
        bus: Arc<dyn EventBus>,
        ledger: Arc<AssignmentLedger>,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        Self {
            repo,
            bus,
            ledger,
            metrics,
        }
    }

    /// Configure (or reconfigure) the building: `floors` floors numbered
    /// from 0 and `lifts` lifts named `L1..`.
    ///
    /// Validation happens before any mutation, so a rejected configuration
    /// leaves the previous one untouched. A valid one replaces it wholesale.
    ///
    /// # Errors
    ///
    /// Domain validation failures (`floors < 2`, `lifts < 1`,
    /// `lifts > floors`) and repository failures, including name conflicts.
    pub async fn configure(&self, floors: u32, lifts: u32) -> Result<System, LifecycleError> {
        let system = System::new(SystemId::new(), floors, lifts)?;
        info!(floors, lifts, system = %system.id, "configuring system");

        self.repo.clear_all().await?;
        self.repo.save_system(system).await?;

        for number in 0..floors {
            let floor = Floor::new(FloorId::new(), number);
            debug!(floor = number, id = %floor.id, "floor created");
            self.repo.save_floor(floor).await?;
        }
        for ordinal in 1..=lifts {
            let lift = Lift::new(LiftId::new(), format!("L{ordinal}"));
            debug!(lift = %lift.name, id = %lift.id, "lift created");
            self.repo.save_lift(lift).await?;
        }

        self.bus.publish(LiftEvent::SystemConfigured {
            system_id: system.id,
            floors,
            lifts,
        });
        info!(system = %system.id, "system configured");
        Ok(system)
    }

    /// The current configuration.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Unconfigured`] when no system exists.
    pub async fn configuration(&self) -> Result<System, LifecycleError> {
        self.repo.get_system().await.map_err(unconfigured)
    }

    /// Aggregate status: operational lifts and active floor calls.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Unconfigured`] or repository failures.
    pub async fn status(&self) -> Result<SystemStatus, LifecycleError> {
        let system = self.repo.get_system().await.map_err(unconfigured)?;
        let lifts = self.repo.list_lifts().await?;
        let floors = self.repo.list_floors().await?;

        Ok(SystemStatus {
            system_id: system.id,
            total_floors: system.total_floors,
            total_lifts: system.total_lifts,
            operational_lifts: lifts
                .iter()
                .filter(|lift| lift.status != LiftStatus::OutOfService)
                .count() as u32,
            active_floor_calls: floors.iter().filter(|floor| floor.has_active_call()).count()
                as u32,
        })
    }

    /// Aggregate metrics: lift status counts plus the dispatch counters.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Unconfigured`] or repository failures.
    pub async fn metrics(&self) -> Result<SystemMetrics, LifecycleError> {
        let system = self.repo.get_system().await.map_err(unconfigured)?;
        let lifts = self.repo.list_lifts().await?;
        let counters = self.metrics.snapshot();

        let count = |status: LiftStatus| lifts.iter().filter(|lift| lift.status == status).count() as u32;
        Ok(SystemMetrics {
            system_id: system.id,
            total_floors: system.total_floors,
            total_lifts: system.total_lifts,
            available_lifts: count(LiftStatus::Available),
            occupied_lifts: count(LiftStatus::Occupied),
            out_of_service_lifts: count(LiftStatus::OutOfService),
            completed_trips: counters.completed_trips,
            failed_dispatches: counters.failed_dispatches,
            capacity_rejections: counters.capacity_rejections,
        })
    }

    /// Reset the simulation: every lift back to the ground floor, available
    /// and empty; the assignment ledger cleared. Floors and the system row
    /// are retained; this is also the recovery sweep for lifts stranded
    /// `Occupied` by a failed trip.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Unconfigured`] or repository failures.
    pub async fn reset(&self) -> Result<(), LifecycleError> {
        let system = self.repo.get_system().await.map_err(unconfigured)?;
        info!(system = %system.id, "resetting system");

        for mut lift in self.repo.list_lifts().await? {
            lift.reset();
            self.repo.update_lift(lift).await?;
        }
        self.ledger.clear_all().await?;

        self.bus.publish(LiftEvent::SystemReset {
            system_id: system.id,
        });
        Ok(())
    }

    /// Trigger a traffic simulation run.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Unconfigured`] or repository failures.
    pub async fn simulate_traffic(
        &self,
        duration_secs: u32,
        intensity: TrafficIntensity,
    ) -> Result<(), LifecycleError> {
        let system = self.repo.get_system().await.map_err(unconfigured)?;
        info!(%intensity, duration_secs, "traffic simulation requested");
        self.bus.publish(LiftEvent::TrafficSimulationStarted {
            system_id: system.id,
            intensity,
            duration_secs,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lift maintenance
    // ------------------------------------------------------------------

    /// Fetch one lift.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::LiftNotFound`] or repository failures.
    pub async fn get_lift(&self, id: LiftId) -> Result<Lift, LifecycleError> {
        self.repo.get_lift(id).await.map_err(|e| lift_not_found(e, id))
    }

    /// All lifts, in creation order.
    ///
    /// # Errors
    ///
    /// Repository failures.
    pub async fn list_lifts(&self) -> Result<Vec<Lift>, LifecycleError> {
        Ok(self.repo.list_lifts().await?)
    }

    /// Operator override of a lift's status.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::LiftNotFound`] or repository failures.
    pub async fn set_lift_status(
        &self,
        id: LiftId,
        status: LiftStatus,
    ) -> Result<Lift, LifecycleError> {
        let mut lift = self.repo.get_lift(id).await.map_err(|e| lift_not_found(e, id))?;
        lift.set_status(status);
        self.repo.update_lift(lift.clone()).await?;
        info!(lift = %lift.name, %status, "lift status set");
        Ok(lift)
    }

    /// Reset one lift to its initial state.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::LiftNotFound`] or repository failures.
    pub async fn reset_lift(&self, id: LiftId) -> Result<Lift, LifecycleError> {
        let mut lift = self.repo.get_lift(id).await.map_err(|e| lift_not_found(e, id))?;
        lift.reset();
        self.repo.update_lift(lift.clone()).await?;
        info!(lift = %lift.name, "lift reset");
        Ok(lift)
    }

    /// Reset every lift, leaving the ledger and floors alone.
    ///
    /// # Errors
    ///
    /// Repository failures.
    pub async fn reset_all_lifts(&self) -> Result<(), LifecycleError> {
        for mut lift in self.repo.list_lifts().await? {
            lift.reset();
            self.repo.update_lift(lift).await?;
        }
        info!("all lifts reset");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Floor queries and maintenance
    // ------------------------------------------------------------------

    /// Fetch one floor by number.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::FloorNotFound`] or repository failures.
    pub async fn get_floor_by_number(&self, number: u32) -> Result<Floor, LifecycleError> {
        self.repo
            .get_floor_by_number(number)
            .await
            .map_err(|e| floor_not_found(e, number))
    }

    /// All floors, in creation order.
    ///
    /// # Errors
    ///
    /// Repository failures.
    pub async fn list_floors(&self) -> Result<Vec<Floor>, LifecycleError> {
        Ok(self.repo.list_floors().await?)
    }

    /// Numbers of the floors with a lit call button.
    ///
    /// # Errors
    ///
    /// Repository failures.
    pub async fn active_floor_calls(&self) -> Result<Vec<u32>, LifecycleError> {
        Ok(self
            .repo
            .list_floors()
            .await?
            .into_iter()
            .filter(Floor::has_active_call)
            .map(|floor| floor.number)
            .collect())
    }

    /// Manually clear a floor's call buttons.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::FloorNotFound`] or repository failures.
    pub async fn reset_floor_buttons(&self, number: u32) -> Result<Floor, LifecycleError> {
        let mut floor = self
            .repo
            .get_floor_by_number(number)
            .await
            .map_err(|e| floor_not_found(e, number))?;
        floor.reset_buttons();
        self.repo.update_floor(floor.clone()).await?;
        debug!(floor = number, "floor buttons reset");
        Ok(floor)
    }
}

fn unconfigured(error: RepositoryError) -> LifecycleError {
    if error.is_not_found() {
        LifecycleError::Unconfigured
    } else {
        error.into()
    }
}

fn lift_not_found(error: RepositoryError, id: LiftId) -> LifecycleError {
    if error.is_not_found() {
        LifecycleError::LiftNotFound(id)
    } else {
        error.into()
    }
}

fn floor_not_found(error: RepositoryError, number: u32) -> LifecycleError {
    if error.is_not_found() {
        LifecycleError::FloorNotFound(number)
    } else {
        error.into()
    }
}
