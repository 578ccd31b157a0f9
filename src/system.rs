/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::info;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{Builder, JoinHandle};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::Config;
use crate::coordinator::hall_calls::DispatchCounters;
use crate::coordinator::{DispatchStats, Dispatcher, HallCallQueue};
use crate::elevator::ElevatorCar;
use crate::shared::{CarEvent, CarState, CarStatus, Direction};

/***************************************/
/*             Public API              */
/***************************************/

/**
 * The building's cars, the hall call queue and the dispatcher.
 *
 * Built once at start-up and passed by reference to whoever needs it. Starts
 * one worker thread per car and one dispatcher thread; both are stopped by
 * `shutdown` or when the system is dropped.
 */
pub struct ElevatorSystem {
    n_floors: u8,
    cars: Vec<ElevatorCar>,
    calls: HallCallQueue,
    counters: Arc<DispatchCounters>,
    dispatcher_terminate_tx: cbc::Sender<()>,
    dispatcher_thread: Mutex<Option<JoinHandle<()>>>,
}

impl ElevatorSystem {
    pub fn new(config: &Config) -> std::io::Result<ElevatorSystem> {
        Self::start(config, None)
    }

    /// Like `new`, with every car publishing its `CarEvent`s on `event_tx`.
    pub fn with_events(config: &Config, event_tx: cbc::Sender<CarEvent>) -> std::io::Result<ElevatorSystem> {
        Self::start(config, Some(event_tx))
    }

    fn start(config: &Config, event_tx: Option<cbc::Sender<CarEvent>>) -> std::io::Result<ElevatorSystem> {
        let n_floors = config.system.n_floors;

        let cars = (0..config.system.n_cars)
            .map(|id| ElevatorCar::spawn(id, n_floors, &config.elevator, event_tx.clone()))
            .collect::<std::io::Result<Vec<ElevatorCar>>>()?;

        let counters = Arc::new(DispatchCounters::default());
        let (calls, calls_rx) = HallCallQueue::new(n_floors, counters.clone());
        let (dispatcher_terminate_tx, dispatcher_terminate_rx) = cbc::bounded::<()>(1);

        let dispatcher = Dispatcher::new(
            &config.dispatcher,
            cars.clone(),
            calls.clone(),
            calls_rx,
            dispatcher_terminate_rx,
            counters.clone(),
        );
        let dispatcher_thread = Builder::new()
            .name("dispatcher".into())
            .spawn(move || dispatcher.run())?;

        info!(
            "Elevator system started: {} floors, {} cars",
            n_floors,
            cars.len()
        );

        Ok(ElevatorSystem {
            n_floors,
            cars,
            calls,
            counters,
            dispatcher_terminate_tx,
            dispatcher_thread: Mutex::new(Some(dispatcher_thread)),
        })
    }

    pub fn n_floors(&self) -> u8 {
        self.n_floors
    }

    /// Hall call from `floor`. Floors outside the building are ignored.
    pub fn submit_call(&self, floor: u8, direction: Direction) {
        self.calls.submit(floor, direction);
    }

    /// Producer handle for hall panels running on other threads.
    pub fn hall_calls(&self) -> HallCallQueue {
        self.calls.clone()
    }

    pub fn cars(&self) -> &[ElevatorCar] {
        &self.cars
    }

    pub fn car(&self, id: usize) -> Option<&ElevatorCar> {
        self.cars.get(id)
    }

    pub fn monitoring(&self) -> Vec<CarStatus> {
        self.cars.iter().map(ElevatorCar::status).collect()
    }

    pub fn monitoring_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.monitoring())
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Nearest idle car that is neither in maintenance nor overloaded.
    pub fn nearest_idle_car(&self, floor: u8) -> Option<&ElevatorCar> {
        self.cars
            .iter()
            .map(|car| (car, car.status()))
            .filter(|(_, status)| status.is_eligible() && status.state == CarState::Idle)
            .min_by_key(|(_, status)| (status.floor as i32 - floor as i32).abs())
            .map(|(car, _)| car)
    }

    pub fn shutdown(&self) {
        let _ = self.dispatcher_terminate_tx.try_send(());
        let handle = self
            .dispatcher_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
            for car in &self.cars {
                car.shutdown();
            }
            info!("Elevator system stopped");
        }
    }
}

impl Drop for ElevatorSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}
