//! Domain events published on the event bus.
//!
//! Every observable transition in the system is a [`LiftEvent`] variant. The
//! payload carries all the context a handler needs; handlers are pure
//! consumers and never reach back into the service that published the event.
//!
//! Events serialize with an adjacent tag:
//!
//! ```json
//! { "type": "lift_arrived",
//!   "payload": { "lift_id": "…", "floor_id": "…", "floor_number": 3 } }
//! ```

use crate::domain::{Direction, FloorId, LiftId, SystemId, TrafficIntensity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A domain event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum LiftEvent {
    /// A floor call was accepted and queued for dispatch.
    LiftRequested {
        /// Floor the call came from.
        floor_number: u32,
        /// Requested direction of travel.
        direction: Direction,
    },
    /// A lift was committed to serve a floor. Published before travel begins.
    LiftAssigned {
        /// The committed lift.
        lift_id: LiftId,
        /// Floor it will serve.
        floor_number: u32,
    },
    /// A lift finished its trip: doors have cycled and it is available again.
    LiftArrived {
        /// The arriving lift.
        lift_id: LiftId,
        /// Id of the floor it arrived at.
        floor_id: FloorId,
        /// Number of the floor it arrived at.
        floor_number: u32,
    },
    /// A call was rejected because the floor reached its assignment cap.
    FloorAtCapacity {
        /// The saturated floor.
        floor_number: u32,
    },
    /// A floor's call buttons were cleared after an arrival.
    FloorButtonsReset {
        /// Id of the cleared floor.
        floor_id: FloorId,
        /// Number of the cleared floor.
        floor_number: u32,
    },
    /// A travelling lift passed (or reached) a floor.
    LiftMoved {
        /// The travelling lift.
        lift_id: LiftId,
        /// The floor it is now on.
        floor: u32,
    },
    /// A new system configuration replaced the previous one.
    SystemConfigured {
        /// Id of the new system.
        system_id: SystemId,
        /// Configured floor count.
        floors: u32,
        /// Configured lift count.
        lifts: u32,
    },
    /// The system was reset to its initial state.
    SystemReset {
        /// Id of the reset system.
        system_id: SystemId,
    },
    /// A traffic simulation run was requested.
    TrafficSimulationStarted {
        /// Id of the system under simulation.
        system_id: SystemId,
        /// Requested intensity.
        intensity: TrafficIntensity,
        /// Requested duration in seconds.
        duration_secs: u32,
    },
}

impl LiftEvent {
    /// The subscription key for this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::LiftRequested { .. } => EventKind::LiftRequested,
            Self::LiftAssigned { .. } => EventKind::LiftAssigned,
            Self::LiftArrived { .. } => EventKind::LiftArrived,
            Self::FloorAtCapacity { .. } => EventKind::FloorAtCapacity,
            Self::FloorButtonsReset { .. } => EventKind::FloorButtonsReset,
            Self::LiftMoved { .. } => EventKind::LiftMoved,
            Self::SystemConfigured { .. } => EventKind::SystemConfigured,
            Self::SystemReset { .. } => EventKind::SystemReset,
            Self::TrafficSimulationStarted { .. } => EventKind::TrafficSimulationStarted,
        }
    }
}

/// Discriminant of [`LiftEvent`], used as the subscription key on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// See [`LiftEvent::LiftRequested`].
    LiftRequested,
    /// See [`LiftEvent::LiftAssigned`].
    LiftAssigned,
    /// See [`LiftEvent::LiftArrived`].
    LiftArrived,
    /// See [`LiftEvent::FloorAtCapacity`].
    FloorAtCapacity,
    /// See [`LiftEvent::FloorButtonsReset`].
    FloorButtonsReset,
    /// See [`LiftEvent::LiftMoved`].
    LiftMoved,
    /// See [`LiftEvent::SystemConfigured`].
    SystemConfigured,
    /// See [`LiftEvent::SystemReset`].
    SystemReset,
    /// See [`LiftEvent::TrafficSimulationStarted`].
    TrafficSimulationStarted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LiftRequested => "lift_requested",
            Self::LiftAssigned => "lift_assigned",
            Self::LiftArrived => "lift_arrived",
            Self::FloorAtCapacity => "floor_at_capacity",
            Self::FloorButtonsReset => "floor_buttons_reset",
            Self::LiftMoved => "lift_moved",
            Self::SystemConfigured => "system_configured",
            Self::SystemReset => "system_reset",
            Self::TrafficSimulationStarted => "traffic_simulation_started",
        };
        write!(f, "{label}")
    }
}
