pub mod car;
pub mod door;
mod fsm;
mod fsm_tests;

pub use car::ElevatorCar;
pub use door::Door;
