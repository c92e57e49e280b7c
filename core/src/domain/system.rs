//! The system configuration entity and its aggregate views.

use super::{DomainError, SystemId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The configured lift system.
///
/// Exactly one `System` exists while the simulation is configured. Creating
/// one validates the sizing invariants; `Configure` replaces it wholesale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    /// Entity id.
    pub id: SystemId,
    /// Number of floors, numbered `0..total_floors`.
    pub total_floors: u32,
    /// Number of lifts, named `L1..L<total_lifts>`.
    pub total_lifts: u32,
}

impl System {
    /// Create a system configuration.
    ///
    /// # Errors
    ///
    /// Rejects fewer than 2 floors, fewer than 1 lift, or more lifts than
    /// floors.
    pub fn new(id: SystemId, total_floors: u32, total_lifts: u32) -> Result<Self, DomainError> {
        if total_floors < 2 {
            return Err(DomainError::TooFewFloors(total_floors));
        }
        if total_lifts < 1 {
            return Err(DomainError::TooFewLifts(total_lifts));
        }
        if total_lifts > total_floors {
            return Err(DomainError::TooManyLifts {
                lifts: total_lifts,
                floors: total_floors,
            });
        }
        Ok(Self {
            id,
            total_floors,
            total_lifts,
        })
    }

    /// Per-floor cap on concurrent assignments: `max(2, ⌈total_lifts / 10⌉)`.
    ///
    /// Integer ceiling, so the cap stays at 2 up to 20 lifts and grows by one
    /// per further ten.
    #[must_use]
    pub const fn max_lifts_per_floor(&self) -> usize {
        let tenth = (self.total_lifts as usize + 9) / 10;
        if tenth > 2 {
            tenth
        } else {
            2
        }
    }

    /// Whether `number` is a valid floor of this system.
    #[must_use]
    pub const fn contains_floor(&self, number: u32) -> bool {
        number < self.total_floors
    }
}

/// Aggregate status view returned by the system status endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Id of the configured system.
    pub system_id: SystemId,
    /// Configured floor count.
    pub total_floors: u32,
    /// Configured lift count.
    pub total_lifts: u32,
    /// Lifts not marked out of service.
    pub operational_lifts: u32,
    /// Floors with at least one lit call button.
    pub active_floor_calls: u32,
}

/// Aggregate metrics view returned by the metrics endpoint.
///
/// Combines lift status counts with the dispatch counters, so operators can
/// see failed dispatches without grepping logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Id of the configured system.
    pub system_id: SystemId,
    /// Configured floor count.
    pub total_floors: u32,
    /// Configured lift count.
    pub total_lifts: u32,
    /// Lifts currently `Available`.
    pub available_lifts: u32,
    /// Lifts currently `Occupied`.
    pub occupied_lifts: u32,
    /// Lifts currently `OutOfService`.
    pub out_of_service_lifts: u32,
    /// Trips that ran to completion.
    pub completed_trips: u64,
    /// Dispatches that found no available lift or failed outright.
    pub failed_dispatches: u64,
    /// Calls rejected because the floor was at its assignment cap.
    pub capacity_rejections: u64,
}

/// Intensity levels accepted by the traffic simulation trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficIntensity {
    /// Sparse call pattern.
    Low,
    /// Steady call pattern.
    Medium,
    /// Rush-hour call pattern.
    High,
}

impl FromStr for TrafficIntensity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(DomainError::InvalidIntensity(other.to_string())),
        }
    }
}

impl fmt::Display for TrafficIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{label}")
    }
}
