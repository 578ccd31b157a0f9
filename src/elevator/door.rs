use crate::shared::DoorState;
use std::sync::{Mutex, PoisonError};

/**
 * Car door.
 *
 * `open` and `close` are idempotent setters guarded by their own lock. There is
 * no interlock with car motion: the door does not stop a car from stepping
 * while it is open, and closing is allowed at any time.
 */
pub struct Door {
    state: Mutex<DoorState>,
}

impl Door {
    pub fn new() -> Door {
        Door {
            state: Mutex::new(DoorState::Closed),
        }
    }

    pub fn open(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = DoorState::Open;
    }

    pub fn close(&self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = DoorState::Closed;
    }

    pub fn state(&self) -> DoorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_open(&self) -> bool {
        self.state() == DoorState::Open
    }
}

impl Default for Door {
    fn default() -> Self {
        Door::new()
    }
}
