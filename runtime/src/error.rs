//! Error types for the dispatch and lifecycle services.

use liftsim_core::{Direction, DomainError, LiftId, RepositoryError};
use thiserror::Error;

/// Errors raised by the dispatch engine and the operator move override.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The requested floor number does not exist.
    #[error("floor {0} not found")]
    FloorNotFound(u32),

    /// The requested lift does not exist.
    #[error("lift {0} not found")]
    LiftNotFound(LiftId),

    /// No system has been configured yet.
    #[error("system is not configured")]
    SystemUnconfigured,

    /// Floor calls must be Up or Down.
    #[error("invalid call direction: {0}")]
    InvalidDirection(Direction),

    /// Operator move target outside the configured floor range.
    #[error("target floor {floor} is outside [0, {total_floors})")]
    TargetOutOfRange {
        /// The rejected target.
        floor: u32,
        /// Configured floor count.
        total_floors: u32,
    },

    /// Operator move on a lift that is mid-trip or out of service.
    #[error("lift {0} is not available")]
    LiftNotAvailable(LiftId),

    /// Operator move onto a floor already at its assignment cap.
    #[error("floor {0} has reached its assignment cap")]
    FloorAtCapacity(u32),

    /// A domain state transition was rejected.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The repository failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors raised by the system lifecycle service.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// No system has been configured yet.
    #[error("system is not configured")]
    Unconfigured,

    /// The requested lift does not exist.
    #[error("lift {0} not found")]
    LiftNotFound(LiftId),

    /// The requested floor number does not exist.
    #[error("floor {0} not found")]
    FloorNotFound(u32),

    /// Configuration invariants were violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The repository failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
