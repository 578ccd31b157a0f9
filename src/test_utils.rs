/***************************************/
/*          Test helpers               */
/***************************************/
use crate::config::{Config, DispatcherConfig, ElevatorConfig, SystemConfig};
use std::thread::sleep;
use std::time::{Duration, Instant};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn elevator_config(floor_travel_time: u64, door_open_time: u64) -> ElevatorConfig {
    ElevatorConfig {
        floor_travel_time,
        door_open_time,
        load_threshold: 1000,
    }
}

pub fn system_config(n_floors: u8, n_cars: usize) -> Config {
    Config {
        system: SystemConfig { n_floors, n_cars },
        elevator: elevator_config(5, 5),
        dispatcher: DispatcherConfig { retry_backoff: 20 },
    }
}

/// Polls `condition` until it holds or `timeout` runs out.
pub fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(2));
    }
    condition()
}
