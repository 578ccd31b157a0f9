/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, info, warn};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::DispatcherConfig;
use crate::coordinator::hall_calls::{DispatchCounters, HallCallQueue};
use crate::elevator::ElevatorCar;
use crate::shared::{CarState, CarStatus, Direction, HallCall};

/***************************************/
/*               Enums                 */
/***************************************/
enum Event {
    NewHallCall(HallCall),
    Terminate,
}

/***************************************/
/*             Public API              */
/***************************************/
pub const IDLE_BONUS: i32 = 5;
pub const SAME_DIRECTION_BONUS: i32 = 3;

/// Lower is better. Distance to the call, minus a bonus for idle cars and for
/// cars already heading towards the call floor in the call direction.
pub fn score(car: &CarStatus, call: &HallCall) -> i32 {
    let mut score = (car.floor as i32 - call.floor as i32).abs();

    if car.state == CarState::Idle {
        score -= IDLE_BONUS;
    }

    let on_the_way = match (car.state, call.direction) {
        (CarState::Up, Direction::Up) => car.floor <= call.floor,
        (CarState::Down, Direction::Down) => car.floor >= call.floor,
        _ => false,
    };
    if on_the_way {
        score -= SAME_DIRECTION_BONUS;
    }

    score
}

/// Id of the best eligible car for `call`, lowest id on ties. `None` when every
/// car is in maintenance or overloaded.
pub fn choose_car(cars: &[CarStatus], call: &HallCall) -> Option<usize> {
    let mut best: Option<(i32, usize)> = None;

    for car in cars.iter().filter(|car| car.is_eligible()) {
        let car_score = score(car, call);
        best = match best {
            Some((best_score, best_id))
                if best_score < car_score || (best_score == car_score && best_id < car.id) =>
            {
                Some((best_score, best_id))
            }
            _ => Some((car_score, car.id)),
        };
    }

    best.map(|(_, id)| id)
}

/**
 * Assigns hall calls to cars.
 *
 * Runs as the single consumer of the hall call queue. Each call is scored
 * against a snapshot of every car; the winner gets the floor appended to its
 * request queue and is woken. The snapshot is not re-checked before the
 * assignment, so a car may change state in between. When no car is eligible
 * the dispatcher waits `retry_backoff` and puts the call back at the end of the
 * queue, with no limit on the number of retries.
 *
 * # Fields
 * - `cars`:            Handles to every car, in id order.
 * - `calls`:           Producer side of the queue, used to re-queue calls.
 * - `calls_rx`:        Consumer side of the queue.
 * - `terminate_rx`:    Shutdown signal, also interrupts the backoff.
 * - `retry_backoff`:   Wait before re-queueing an unassignable call.
 * - `counters`:        Assigned / re-queued / dropped counters.
 */
pub struct Dispatcher {
    cars: Vec<ElevatorCar>,
    calls: HallCallQueue,
    calls_rx: cbc::Receiver<HallCall>,
    terminate_rx: cbc::Receiver<()>,
    retry_backoff: Duration,
    counters: Arc<DispatchCounters>,
}

impl Dispatcher {
    pub(crate) fn new(
        config: &DispatcherConfig,
        cars: Vec<ElevatorCar>,
        calls: HallCallQueue,
        calls_rx: cbc::Receiver<HallCall>,
        terminate_rx: cbc::Receiver<()>,
        counters: Arc<DispatchCounters>,
    ) -> Dispatcher {
        Dispatcher {
            cars,
            calls,
            calls_rx,
            terminate_rx,
            retry_backoff: Duration::from_millis(config.retry_backoff),
            counters,
        }
    }

    pub fn run(self) {
        // Main loop
        loop {
            match self.wait_for_event() {
                Event::NewHallCall(call) => {
                    if !self.handle_call(call) {
                        break;
                    }
                }
                Event::Terminate => break,
            }
        }
        debug!("Dispatcher terminated");
    }

    fn wait_for_event(&self) -> Event {
        cbc::select! {
            recv(self.calls_rx) -> call => {
                match call {
                    Ok(call) => Event::NewHallCall(call),
                    Err(_) => Event::Terminate,
                }
            },
            recv(self.terminate_rx) -> _ => Event::Terminate,
        }
    }

    // Returns false if terminated during the backoff
    fn handle_call(&self, call: HallCall) -> bool {
        let statuses: Vec<CarStatus> = self.cars.iter().map(ElevatorCar::status).collect();

        let car = match choose_car(&statuses, &call).and_then(|id| self.car(id)) {
            Some(car) => car,
            None => {
                debug!(
                    "Dispatcher: no car available for floor {} ({:?}), retrying in {:?}",
                    call.floor, call.direction, self.retry_backoff
                );
                match self.terminate_rx.recv_timeout(self.retry_backoff) {
                    Err(cbc::RecvTimeoutError::Timeout) => {
                        self.calls.requeue(call);
                        return true;
                    }
                    _ => return false,
                }
            }
        };

        self.assign(car, call);
        true
    }

    /// Hands `call` to `car`. Nothing is re-validated after scoring, so a car
    /// that went into maintenance in between refuses the floor and the call
    /// is lost.
    pub(crate) fn assign(&self, car: &ElevatorCar, call: HallCall) -> bool {
        if !car.register_request(call.floor) {
            warn!(
                "Dispatcher: Elevator {} refused floor {} ({:?}), call lost",
                car.id() + 1,
                call.floor,
                call.direction
            );
            return false;
        }

        info!(
            "Dispatcher: assigning floor {} ({:?}) to Elevator {}",
            call.floor,
            call.direction,
            car.id() + 1
        );
        car.move_car();
        self.counters.assigned.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn car(&self, id: usize) -> Option<&ElevatorCar> {
        self.cars.iter().find(|car| car.id() == id)
    }
}
