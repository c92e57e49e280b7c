//! The lift entity and its trip state machine.

use super::{DomainError, LiftId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default cabin capacity for newly created lifts.
pub const DEFAULT_CAPACITY: u32 = 10;

/// Direction of lift movement, and of floor call buttons.
///
/// The integer encoding (`0 = Up`, `1 = Down`, `2 = Idle`) is a stable wire
/// contract: callers submit `{"direction": 0}` and the encoding must never
/// change between releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Direction {
    /// Moving (or calling) upwards.
    Up = 0,
    /// Moving (or calling) downwards.
    Down = 1,
    /// Not moving.
    Idle = 2,
}

impl Direction {
    /// Direction of travel from one floor to another.
    #[must_use]
    pub fn of_travel(from: u32, to: u32) -> Self {
        use std::cmp::Ordering;
        match to.cmp(&from) {
            Ordering::Greater => Self::Up,
            Ordering::Less => Self::Down,
            Ordering::Equal => Self::Idle,
        }
    }

    /// Whether this direction is a valid floor call (Up or Down).
    #[must_use]
    pub const fn is_call(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        direction as Self
    }
}

impl TryFrom<u8> for Direction {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Up),
            1 => Ok(Self::Down),
            2 => Ok(Self::Idle),
            other => Err(DomainError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Idle => "Idle",
        };
        write!(f, "{label}")
    }
}

/// Operational status of a lift.
///
/// Serializes as its string label (`"Available"`, `"Occupied"`,
/// `"OutOfService"`), which is also the value pushed on the status stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiftStatus {
    /// Idle and eligible for dispatch.
    Available,
    /// Committed to a trip.
    Occupied,
    /// Taken out of rotation by an operator.
    OutOfService,
}

impl From<LiftStatus> for u8 {
    fn from(status: LiftStatus) -> Self {
        match status {
            LiftStatus::Available => 0,
            LiftStatus::Occupied => 1,
            LiftStatus::OutOfService => 2,
        }
    }
}

impl TryFrom<u8> for LiftStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Available),
            1 => Ok(Self::Occupied),
            2 => Ok(Self::OutOfService),
            other => Err(format!("invalid lift status: {other}")),
        }
    }
}

impl std::str::FromStr for LiftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(Self::Available),
            "Occupied" => Ok(Self::Occupied),
            "OutOfService" => Ok(Self::OutOfService),
            other => Err(format!("invalid lift status: {other}")),
        }
    }
}

impl fmt::Display for LiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Available => "Available",
            Self::Occupied => "Occupied",
            Self::OutOfService => "OutOfService",
        };
        write!(f, "{label}")
    }
}

/// A lift in the system.
///
/// The entity is a pure value object: [`Lift::begin_trip`],
/// [`Lift::advance_to`], [`Lift::arrive`], and [`Lift::make_available`] form
/// the trip state machine, but the delays between those transitions are the
/// movement orchestrator's business. An `Available` lift always has
/// `passengers = 0` and `direction = Idle`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lift {
    /// Entity id.
    pub id: LiftId,
    /// Human-readable name (`L1`, `L2`, …). Unique across the system.
    pub name: String,
    /// Floor the cabin is currently on (or passing).
    pub current_floor: u32,
    /// Floor the cabin is heading to. Equal to `current_floor` when idle.
    pub target_floor: u32,
    /// Direction of travel.
    pub direction: Direction,
    /// Operational status.
    pub status: LiftStatus,
    /// Cabin capacity.
    pub capacity: u32,
    /// Passengers currently on board.
    pub passengers: u32,
    /// When the cabin last changed floors.
    pub last_moved_at: DateTime<Utc>,
}

impl Lift {
    /// Create a lift in its initial state: ground floor, idle, available.
    #[must_use]
    pub fn new(id: LiftId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            current_floor: 0,
            target_floor: 0,
            direction: Direction::Idle,
            status: LiftStatus::Available,
            capacity: DEFAULT_CAPACITY,
            passengers: 0,
            last_moved_at: Utc::now(),
        }
    }

    /// Whether this lift is eligible for dispatch.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == LiftStatus::Available
    }

    /// Commit the lift to a trip.
    ///
    /// Sets the target, the direction of travel, and `Occupied`.
    ///
    /// # Errors
    ///
    /// [`DomainError::AlreadyAtFloor`] when the target equals the current
    /// floor.
    pub fn begin_trip(&mut self, target_floor: u32) -> Result<(), DomainError> {
        if target_floor == self.current_floor {
            return Err(DomainError::AlreadyAtFloor(target_floor));
        }
        self.target_floor = target_floor;
        self.direction = Direction::of_travel(self.current_floor, target_floor);
        self.status = LiftStatus::Occupied;
        Ok(())
    }

    /// Record an intermediate position while travelling.
    pub fn advance_to(&mut self, floor: u32) {
        self.current_floor = floor;
        self.last_moved_at = Utc::now();
    }

    /// Complete the travel leg: the cabin is at the target, no longer moving.
    ///
    /// The lift stays `Occupied` until the doors have cycled.
    pub fn arrive(&mut self) {
        self.current_floor = self.target_floor;
        self.direction = Direction::Idle;
        self.last_moved_at = Utc::now();
    }

    /// Return the lift to rotation after the doors close.
    pub fn make_available(&mut self) {
        self.status = LiftStatus::Available;
        self.direction = Direction::Idle;
        self.passengers = 0;
    }

    /// Board passengers.
    ///
    /// # Errors
    ///
    /// [`DomainError::CapacityExceeded`] when the cabin would overflow.
    pub fn board(&mut self, count: u32) -> Result<(), DomainError> {
        let requested = self.passengers + count;
        if requested > self.capacity {
            return Err(DomainError::CapacityExceeded {
                capacity: self.capacity,
                requested,
            });
        }
        self.passengers = requested;
        Ok(())
    }

    /// Disembark passengers.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidPassengerCount`] when more passengers leave than
    /// are on board.
    pub fn disembark(&mut self, count: u32) -> Result<(), DomainError> {
        if count > self.passengers {
            return Err(DomainError::InvalidPassengerCount {
                on_board: self.passengers,
                leaving: count,
            });
        }
        self.passengers -= count;
        Ok(())
    }

    /// Set the operational status directly (operator override).
    pub fn set_status(&mut self, status: LiftStatus) {
        self.status = status;
        if status == LiftStatus::Available {
            self.direction = Direction::Idle;
            self.passengers = 0;
        }
    }

    /// Restore the initial state: ground floor, idle, available, empty.
    pub fn reset(&mut self) {
        self.current_floor = 0;
        self.target_floor = 0;
        self.direction = Direction::Idle;
        self.status = LiftStatus::Available;
        self.passengers = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lift() -> Lift {
        Lift::new(LiftId::new(), "L1")
    }

    #[test]
    fn new_lift_starts_idle_on_ground_floor() {
        let lift = lift();
        assert_eq!(lift.current_floor, 0);
        assert_eq!(lift.direction, Direction::Idle);
        assert_eq!(lift.status, LiftStatus::Available);
        assert_eq!(lift.passengers, 0);
        assert!(lift.is_available());
    }

    #[test]
    fn begin_trip_sets_direction_and_occupied() {
        let mut lift = lift();
        lift.begin_trip(5).unwrap();
        assert_eq!(lift.target_floor, 5);
        assert_eq!(lift.direction, Direction::Up);
        assert_eq!(lift.status, LiftStatus::Occupied);

        lift.arrive();
        lift.make_available();
        lift.begin_trip(2).unwrap();
        assert_eq!(lift.direction, Direction::Down);
    }

    #[test]
    fn begin_trip_to_current_floor_is_rejected() {
        let mut lift = lift();
        assert_eq!(lift.begin_trip(0), Err(DomainError::AlreadyAtFloor(0)));
        assert!(lift.is_available());
    }

    #[test]
    fn arrive_completes_the_travel_leg() {
        let mut lift = lift();
        lift.begin_trip(3).unwrap();
        lift.advance_to(1);
        lift.advance_to(2);
        lift.arrive();
        assert_eq!(lift.current_floor, 3);
        assert_eq!(lift.direction, Direction::Idle);
        assert_eq!(lift.status, LiftStatus::Occupied);

        lift.make_available();
        assert!(lift.is_available());
        assert_eq!(lift.passengers, 0);
    }

    #[test]
    fn boarding_respects_capacity() {
        let mut lift = lift();
        lift.board(10).unwrap();
        assert!(matches!(
            lift.board(1),
            Err(DomainError::CapacityExceeded { .. })
        ));
        lift.disembark(4).unwrap();
        assert_eq!(lift.passengers, 6);
        assert!(matches!(
            lift.disembark(7),
            Err(DomainError::InvalidPassengerCount { .. })
        ));
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut lift = lift();
        lift.begin_trip(4).unwrap();
        lift.advance_to(2);
        lift.reset();
        assert_eq!(lift.current_floor, 0);
        assert_eq!(lift.direction, Direction::Idle);
        assert_eq!(lift.status, LiftStatus::Available);
    }

    #[test]
    fn direction_wire_encoding_is_stable() {
        assert_eq!(serde_json::to_string(&Direction::Up).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Direction::Down).unwrap(), "1");
        assert_eq!(
            serde_json::from_str::<Direction>("1").unwrap(),
            Direction::Down
        );
        assert!(serde_json::from_str::<Direction>("7").is_err());
    }

    #[test]
    fn status_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&LiftStatus::OutOfService).unwrap(),
            "\"OutOfService\""
        );
    }
}
