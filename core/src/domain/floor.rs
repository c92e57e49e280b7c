//! The floor entity and its call buttons.

use super::{lift::Direction, DomainError, FloorId};
use serde::{Deserialize, Serialize};

/// A floor in the building.
///
/// Carries the two call buttons. Buttons are pressed when a call is accepted
/// and cleared by the arrival handler once a lift reaches the floor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    /// Entity id, used by the assignment ledger.
    pub id: FloorId,
    /// Dense floor number in `[0, total_floors)`, used by the dispatch
    /// engine.
    pub number: u32,
    /// Whether the up button is lit.
    pub up_call: bool,
    /// Whether the down button is lit.
    pub down_call: bool,
}

impl Floor {
    /// Create a floor with both buttons cleared.
    #[must_use]
    pub const fn new(id: FloorId, number: u32) -> Self {
        Self {
            id,
            number,
            up_call: false,
            down_call: false,
        }
    }

    /// Light the call button for the given direction.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidDirection`] for [`Direction::Idle`]; there is
    /// no idle button on the wall.
    pub fn press_button(&mut self, direction: Direction) -> Result<(), DomainError> {
        match direction {
            Direction::Up => self.up_call = true,
            Direction::Down => self.down_call = true,
            Direction::Idle => {
                return Err(DomainError::InvalidDirection(direction.to_string()));
            }
        }
        Ok(())
    }

    /// Clear the call button for the given direction.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidDirection`] for [`Direction::Idle`].
    pub fn clear_button(&mut self, direction: Direction) -> Result<(), DomainError> {
        match direction {
            Direction::Up => self.up_call = false,
            Direction::Down => self.down_call = false,
            Direction::Idle => {
                return Err(DomainError::InvalidDirection(direction.to_string()));
            }
        }
        Ok(())
    }

    /// Clear both buttons. Invoked when a lift arrives.
    pub fn reset_buttons(&mut self) {
        self.up_call = false;
        self.down_call = false;
    }

    /// Whether either button is lit.
    #[must_use]
    pub const fn has_active_call(&self) -> bool {
        self.up_call || self.down_call
    }
}
