/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{Builder, JoinHandle};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::ElevatorConfig;
use crate::elevator::door::Door;
use crate::elevator::fsm::CarWorker;
use crate::shared::{CarEvent, CarState, CarStatus};

/***************************************/
/*        Shared car state             */
/***************************************/

/// Movement state of one car. Only ever touched with the car lock held.
pub(crate) struct CarCore {
    pub floor: u8,
    pub state: CarState,
    pub requests: VecDeque<u8>,
    pub target: Option<u8>,
    pub load_kg: u32,
    pub overloaded: bool,
    pub maintenance: bool,
    // Bumped on every entry into maintenance so the worker can tell a
    // maintenance cycle happened while it was asleep.
    pub service_epoch: u64,
}

pub(crate) struct CarShared {
    pub id: usize,
    pub n_floors: u8,
    pub load_threshold: u32,
    pub door: Door,
    core: Mutex<CarCore>,
    event_tx: Option<cbc::Sender<CarEvent>>,
}

impl CarShared {
    pub fn lock(&self) -> MutexGuard<'_, CarCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn emit(&self, event: CarEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    fn snapshot(&self, core: &CarCore) -> CarStatus {
        CarStatus {
            id: self.id,
            floor: core.floor,
            state: core.state,
            direction: core.state.direction(),
            load_kg: core.load_kg,
            overloaded: core.overloaded,
            maintenance: core.maintenance,
            door: self.door.state(),
            pending: core.requests.len(),
            target: core.target,
        }
    }
}

/***************************************/
/*             Public API              */
/***************************************/

/**
 * Handle to one elevator car and its dedicated worker thread.
 *
 * Cloning the handle is cheap; every clone controls the same car. All movement
 * state sits behind one per-car lock shared by the worker and the control
 * operations below, so only the worker ever steps the car and a control call
 * never observes a half-applied transition.
 *
 * # Control operations
 * - `register_request` / `move_car`:   enqueue a target and wake the worker.
 * - `enter_maintenance` / `emergency_stop` / `exit_maintenance`: take the car
 *   out of and back into service.
 * - `add_load` / `remove_load`:       weight sensor input.
 */
#[derive(Clone)]
pub struct ElevatorCar {
    shared: Arc<CarShared>,
    move_tx: cbc::Sender<()>,
    terminate_tx: cbc::Sender<()>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ElevatorCar {
    /// Creates the car at floor 0, idle, door closed, and starts its worker.
    pub fn spawn(
        id: usize,
        n_floors: u8,
        config: &ElevatorConfig,
        event_tx: Option<cbc::Sender<CarEvent>>,
    ) -> std::io::Result<ElevatorCar> {
        let shared = Arc::new(CarShared {
            id,
            n_floors,
            load_threshold: config.load_threshold,
            door: Door::new(),
            core: Mutex::new(CarCore {
                floor: 0,
                state: CarState::Idle,
                requests: VecDeque::new(),
                target: None,
                load_kg: 0,
                overloaded: false,
                maintenance: false,
                service_epoch: 0,
            }),
            event_tx,
        });

        let (move_tx, move_rx) = cbc::bounded::<()>(1);
        let (terminate_tx, terminate_rx) = cbc::bounded::<()>(1);

        let worker = CarWorker::new(shared.clone(), config, move_rx, terminate_rx);
        let handle = Builder::new()
            .name(format!("car_{}", id))
            .spawn(move || worker.run())?;

        Ok(ElevatorCar {
            shared,
            move_tx,
            terminate_tx,
            worker: Arc::new(Mutex::new(Some(handle))),
        })
    }

    pub fn id(&self) -> usize {
        self.shared.id
    }

    pub fn n_floors(&self) -> u8 {
        self.shared.n_floors
    }

    pub fn door(&self) -> &Door {
        &self.shared.door
    }

    pub fn current_floor(&self) -> u8 {
        self.shared.lock().floor
    }

    pub fn state(&self) -> CarState {
        self.shared.lock().state
    }

    pub fn is_in_maintenance(&self) -> bool {
        self.shared.lock().maintenance
    }

    pub fn is_overloaded(&self) -> bool {
        self.shared.lock().overloaded
    }

    pub fn load_kg(&self) -> u32 {
        self.shared.lock().load_kg
    }

    pub fn pending_requests(&self) -> Vec<u8> {
        self.shared.lock().requests.iter().copied().collect()
    }

    pub fn status(&self) -> CarStatus {
        let core = self.shared.lock();
        self.shared.snapshot(&core)
    }

    /// Appends `floor` to the request queue and returns whether it was queued.
    /// Ignored while in maintenance and for floors outside the building.
    pub fn register_request(&self, floor: u8) -> bool {
        if floor >= self.shared.n_floors {
            warn!("Car {}: ignoring request for floor {} outside the building", self.id(), floor);
            return false;
        }

        let mut core = self.shared.lock();
        if core.maintenance {
            warn!("Car {}: ignoring request for floor {} during maintenance", self.id(), floor);
            return false;
        }
        core.requests.push_back(floor);
        true
    }

    /// Wakes the worker so it drains the request queue. Safe to call any number
    /// of times: at most one wake-up is held while the worker is busy.
    pub fn move_car(&self) {
        if self.is_in_maintenance() {
            return;
        }
        let _ = self.move_tx.try_send(());
    }

    pub fn enter_maintenance(&self) {
        self.take_out_of_service("maintenance");
    }

    pub fn emergency_stop(&self) {
        self.take_out_of_service("emergency stop");
    }

    pub fn exit_maintenance(&self) {
        let mut core = self.shared.lock();
        if !core.maintenance {
            return;
        }
        core.maintenance = false;
        core.state = CarState::Idle;
        self.shared.door.close();

        info!("Car {}: back in service at floor {}", self.id(), core.floor);
        self.shared.emit(CarEvent::MaintenanceExited {
            car: self.id(),
            floor: core.floor,
        });
    }

    pub fn add_load(&self, kg: u32) {
        let mut core = self.shared.lock();
        core.load_kg = core.load_kg.saturating_add(kg);
        let was_overloaded = core.overloaded;
        core.overloaded = core.load_kg > self.shared.load_threshold;

        if core.overloaded && !was_overloaded {
            warn!("Car {}: overloaded at {}kg", self.id(), core.load_kg);
        }
    }

    pub fn remove_load(&self, kg: u32) {
        let resume = {
            let mut core = self.shared.lock();
            core.load_kg = core.load_kg.saturating_sub(kg);
            let was_overloaded = core.overloaded;
            core.overloaded = core.load_kg > self.shared.load_threshold;

            was_overloaded && !core.overloaded && !core.maintenance && !core.requests.is_empty()
        };

        // Departures blocked by the overload can go ahead now
        if resume {
            info!("Car {}: load back under threshold, resuming", self.id());
            let _ = self.move_tx.try_send(());
        }
    }

    /// Stops the worker thread. The car keeps its last state.
    pub fn shutdown(&self) {
        let _ = self.terminate_tx.try_send(());
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn take_out_of_service(&self, reason: &str) {
        let mut core = self.shared.lock();
        let discarded = core.requests.len();
        core.requests.clear();
        core.maintenance = true;
        core.service_epoch += 1;
        core.state = CarState::Maintenance;
        self.shared.door.open();

        info!(
            "Car {}: {} at floor {}, {} pending request(s) discarded",
            self.id(),
            reason,
            core.floor,
            discarded
        );
        self.shared.emit(CarEvent::MaintenanceEntered {
            car: self.id(),
            floor: core.floor,
            discarded,
        });
    }
}
