//! Multi-car elevator dispatch and car control.
//!
//! An [`ElevatorSystem`] owns N [`ElevatorCar`]s, each driven by its own worker
//! thread, and one dispatcher thread that assigns hall calls to the best
//! eligible car.

pub mod config;
pub mod coordinator;
pub mod elevator;
pub mod panel;
pub mod shared;
pub mod system;

#[cfg(test)]
mod test_utils;

pub use coordinator::{DispatchStats, HallCallQueue};
pub use elevator::{Door, ElevatorCar};
pub use shared::{CarEvent, CarState, CarStatus, Direction, DoorState, HallCall};
pub use system::ElevatorSystem;
