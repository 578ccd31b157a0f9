use crate::config::ElevatorConfig;
use crate::elevator::car::CarShared;
use crate::shared::{CarEvent, CarState};
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

enum Next {
    Park,
    Serve(u8),
    Travel { target: u8, epoch: u64 },
}

enum Travel {
    Arrived,
    Aborted,
}

/// The worker was told to stop while running or sleeping.
struct Terminated;

/**
 * Worker loop driving one elevator car.
 *
 * One `CarWorker` runs per car on its own thread and is the only code that
 * changes the car's floor, so moves for a car never overlap. It sleeps until a
 * wake-up arrives on `move_rx`, then drains the request queue in FIFO order:
 *
 * 1. In maintenance: park until the next wake-up.
 * 2. Queue empty: go idle and park.
 * 3. Head equals the current floor: door cycle.
 * 4. Overloaded: leave the head queued and park (no departure).
 * 5. Otherwise travel one floor per `floor_travel_time`, re-checking
 *    maintenance and overload before each step. Either one aborts the move at
 *    the floor reached and the target is dropped. On arrival: door cycle.
 *
 * # Fields
 * - `shared`:              State shared with the `ElevatorCar` handle.
 * - `floor_travel_time`:   Time to travel one floor.
 * - `door_open_time`:      Dwell time with the door open.
 * - `move_rx`:             Wake-ups sent by `move_car` and `remove_load`.
 * - `terminate_rx`:        Shutdown signal, also interrupts any sleep.
 */
pub(crate) struct CarWorker {
    shared: Arc<CarShared>,
    floor_travel_time: Duration,
    door_open_time: Duration,
    move_rx: cbc::Receiver<()>,
    terminate_rx: cbc::Receiver<()>,
}

impl CarWorker {
    pub fn new(
        shared: Arc<CarShared>,
        config: &ElevatorConfig,
        move_rx: cbc::Receiver<()>,
        terminate_rx: cbc::Receiver<()>,
    ) -> CarWorker {
        CarWorker {
            shared,
            floor_travel_time: Duration::from_millis(config.floor_travel_time),
            door_open_time: Duration::from_millis(config.door_open_time),
            move_rx,
            terminate_rx,
        }
    }

    pub fn run(self) {
        loop {
            cbc::select! {
                recv(self.move_rx) -> msg => {
                    match msg {
                        Ok(()) => {
                            if self.drain().is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                recv(self.terminate_rx) -> _ => break,
            }
        }
        debug!("Car {}: worker stopped", self.shared.id);
    }

    fn drain(&self) -> Result<(), Terminated> {
        loop {
            match self.next_step() {
                Next::Park => return Ok(()),
                Next::Serve(floor) => self.door_cycle(floor)?,
                Next::Travel { target, epoch } => {
                    if let Travel::Arrived = self.travel(target, epoch)? {
                        self.door_cycle(target)?;
                    }
                }
            }
        }
    }

    fn next_step(&self) -> Next {
        let id = self.shared.id;
        let mut core = self.shared.lock();

        if core.maintenance {
            core.target = None;
            return Next::Park;
        }

        let target = match core.requests.front() {
            Some(&target) => target,
            None => {
                core.state = CarState::Idle;
                core.target = None;
                return Next::Park;
            }
        };

        if target == core.floor {
            core.requests.pop_front();
            core.state = CarState::Idle;
            core.target = Some(target);
            return Next::Serve(target);
        }

        if core.overloaded {
            core.state = CarState::Idle;
            core.target = None;
            warn!("Car {}: overloaded, holding departure to floor {}", id, target);
            self.shared.emit(CarEvent::Blocked {
                car: id,
                floor: core.floor,
                target,
            });
            return Next::Park;
        }

        core.requests.pop_front();
        core.target = Some(target);
        core.state = if target > core.floor {
            CarState::Up
        } else {
            CarState::Down
        };

        info!("Car {}: departing floor {} for floor {}", id, core.floor, target);
        self.shared.emit(CarEvent::Departed {
            car: id,
            from: core.floor,
            target,
        });

        Next::Travel {
            target,
            epoch: core.service_epoch,
        }
    }

    fn travel(&self, target: u8, epoch: u64) -> Result<Travel, Terminated> {
        let id = self.shared.id;

        loop {
            self.pause(self.floor_travel_time)?;

            let mut core = self.shared.lock();

            let interrupted = core.maintenance || core.service_epoch != epoch;
            if interrupted || core.overloaded {
                if !core.maintenance {
                    core.state = CarState::Idle;
                }
                core.target = None;
                warn!(
                    "Car {}: move to floor {} aborted at floor {}",
                    id, target, core.floor
                );
                self.shared.emit(CarEvent::Aborted {
                    car: id,
                    floor: core.floor,
                    target,
                });
                return Ok(Travel::Aborted);
            }

            let from = core.floor;
            core.floor = if target > from { from + 1 } else { from - 1 };
            debug!("Car {}: floor {} -> {}", id, from, core.floor);
            self.shared.emit(CarEvent::FloorStep {
                car: id,
                from,
                to: core.floor,
            });

            if core.floor == target {
                // Keeps its travel state through the dwell while other stops are queued
                let next_is_here = core.requests.front().map_or(true, |&next| next == target);
                if next_is_here {
                    core.state = CarState::Idle;
                }
                info!("Car {}: arrived at floor {}", id, target);
                self.shared.emit(CarEvent::Arrived { car: id, floor: target });
                return Ok(Travel::Arrived);
            }
        }
    }

    fn door_cycle(&self, floor: u8) -> Result<(), Terminated> {
        let id = self.shared.id;

        {
            let mut core = self.shared.lock();
            if core.maintenance {
                core.target = None;
                return Ok(());
            }
            self.shared.door.open();
            debug!("Car {}: door open at floor {}", id, floor);
            self.shared.emit(CarEvent::DoorOpened { car: id, floor });
        }

        self.pause(self.door_open_time)?;

        let mut core = self.shared.lock();
        // Maintenance entered during the dwell keeps the door open
        if !core.maintenance {
            self.shared.door.close();
            debug!("Car {}: door closed at floor {}", id, floor);
            self.shared.emit(CarEvent::DoorClosed { car: id, floor });
        }
        core.target = None;
        Ok(())
    }

    fn pause(&self, duration: Duration) -> Result<(), Terminated> {
        match self.terminate_rx.recv_timeout(duration) {
            Err(cbc::RecvTimeoutError::Timeout) => Ok(()),
            _ => Err(Terminated),
        }
    }
}
