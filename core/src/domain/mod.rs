//! Domain entities for the lift simulation.
//!
//! The three persistent entities ([`System`], [`Floor`], and [`Lift`]) are
//! plain value objects. They validate their own invariants and expose state
//! transitions as methods, but they never perform I/O and never sleep: the
//! movement orchestrator owns time, the repository owns storage.

mod floor;
mod ids;
mod lift;
mod system;

pub use floor::Floor;
pub use ids::{FloorId, LiftId, SystemId};
pub use lift::{Direction, Lift, LiftStatus};
pub use system::{System, SystemMetrics, SystemStatus, TrafficIntensity};

use thiserror::Error;

/// Errors raised by domain state transitions and constructors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A system needs at least two floors to be worth simulating.
    #[error("system must have at least 2 floors, got {0}")]
    TooFewFloors(u32),

    /// A system needs at least one lift.
    #[error("system must have at least 1 lift, got {0}")]
    TooFewLifts(u32),

    /// More lifts than floors is rejected at configuration time.
    #[error("system cannot have more lifts ({lifts}) than floors ({floors})")]
    TooManyLifts {
        /// Requested lift count.
        lifts: u32,
        /// Requested floor count.
        floors: u32,
    },

    /// A trip to the floor the lift is already on is meaningless.
    #[error("lift is already on floor {0}")]
    AlreadyAtFloor(u32),

    /// Boarding more passengers than the cabin holds.
    #[error("exceeds lift capacity of {capacity} (requested {requested})")]
    CapacityExceeded {
        /// Cabin capacity.
        capacity: u32,
        /// Passenger count the operation would have produced.
        requested: u32,
    },

    /// Disembarking more passengers than are on board.
    #[error("invalid passenger count: {on_board} on board, {leaving} leaving")]
    InvalidPassengerCount {
        /// Passengers currently on board.
        on_board: u32,
        /// Passengers attempting to leave.
        leaving: u32,
    },

    /// Floor call buttons only exist for Up and Down.
    #[error("invalid call direction: {0}")]
    InvalidDirection(String),

    /// Unknown traffic intensity label.
    #[error("invalid traffic intensity: {0}")]
    InvalidIntensity(String),
}
