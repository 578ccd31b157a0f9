/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CarState {
    Idle,
    Up,
    Down,
    Maintenance,
}

impl CarState {
    /// Travel direction implied by the state, `None` when not moving.
    pub fn direction(&self) -> Option<Direction> {
        match *self {
            CarState::Up => Some(Direction::Up),
            CarState::Down => Some(Direction::Down),
            CarState::Idle | CarState::Maintenance => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    Open,
    Closed,
}

/// A directional request for a car made from a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HallCall {
    pub floor: u8,
    pub direction: Direction,
}

impl HallCall {
    pub fn new(floor: u8, direction: Direction) -> HallCall {
        HallCall { floor, direction }
    }
}

/**
 * Read-only snapshot of one car, taken atomically under the car lock.
 *
 * # Fields
 * - `id`:          Car id, also its position in the dispatcher ordering.
 * - `floor`:       Current floor.
 * - `state`:       State machine state.
 * - `direction`:   Direction derived from `state`.
 * - `load_kg`:     Current load.
 * - `overloaded`:  `load_kg` is above the configured threshold.
 * - `maintenance`: Car is taken out of service.
 * - `door`:        Door state.
 * - `pending`:     Number of queued targets, not counting `target`.
 * - `target`:      Target the worker is currently serving, if any.
 */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarStatus {
    pub id: usize,
    pub floor: u8,
    pub state: CarState,
    pub direction: Option<Direction>,
    pub load_kg: u32,
    pub overloaded: bool,
    pub maintenance: bool,
    pub door: DoorState,
    pub pending: usize,
    pub target: Option<u8>,
}

impl CarStatus {
    /// Idle with nothing queued and nothing in flight.
    pub fn is_quiescent(&self) -> bool {
        self.state == CarState::Idle && self.pending == 0 && self.target.is_none()
    }

    pub fn is_eligible(&self) -> bool {
        !self.maintenance && !self.overloaded
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Elevator {} ► Floor: {} | State: {:?} | Door: {:?} | Load: {}kg | Maintenance: {} | Overloaded: {}",
            self.id + 1,
            self.floor,
            self.state,
            self.door,
            self.load_kg,
            self.maintenance,
            self.overloaded,
        )
    }
}

/// Notifications published by a car worker and its control operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CarEvent {
    Departed { car: usize, from: u8, target: u8 },
    FloorStep { car: usize, from: u8, to: u8 },
    Arrived { car: usize, floor: u8 },
    Aborted { car: usize, floor: u8, target: u8 },
    Blocked { car: usize, floor: u8, target: u8 },
    DoorOpened { car: usize, floor: u8 },
    DoorClosed { car: usize, floor: u8 },
    MaintenanceEntered { car: usize, floor: u8, discarded: usize },
    MaintenanceExited { car: usize, floor: u8 },
}
