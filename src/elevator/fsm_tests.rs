/*
 * Unit tests for elevator module
 *
 * The unit tests follows the Arrange, Act, Assert pattern.
 *
 * Tests:
 * - test_car_init
 * - test_car_drains_single_request
 * - test_car_serves_requests_fifo
 * - test_car_keeps_direction_during_dwell_with_stops_queued
 * - test_car_idle_during_dwell_at_last_stop
 * - test_car_request_at_current_floor_cycles_door
 * - test_car_ignores_out_of_range_request
 * - test_car_maintenance_preempts_move
 * - test_car_maintenance_during_dwell_keeps_door_open
 * - test_car_exit_maintenance
 * - test_car_ignores_requests_during_maintenance
 * - test_car_emergency_stop
 * - test_car_overload_blocks_departure
 * - test_car_overload_aborts_transit
 * - test_car_remove_load_clamps_at_zero
 * - test_car_single_flight_under_concurrent_triggers
 * - test_car_coalesces_triggers_while_busy
 * - test_car_shutdown_stops_worker
 */

/***************************************/
/*             Unit tests              */
/***************************************/
#[cfg(test)]
mod fsm_tests {
    use crate::coordinator::dispatcher::score;
    use crate::elevator::ElevatorCar;
    use crate::shared::{CarEvent, CarState, Direction, DoorState, HallCall};
    use crate::test_utils::{elevator_config, wait_until, TIMEOUT};
    use crossbeam_channel::{unbounded, Receiver};
    use std::thread::{sleep, spawn};
    use std::time::Duration;

    const N_FLOORS: u8 = 10;

    fn setup_car(floor_travel_time: u64, door_open_time: u64) -> (ElevatorCar, Receiver<CarEvent>) {
        let (event_tx, event_rx) = unbounded::<CarEvent>();
        let config = elevator_config(floor_travel_time, door_open_time);
        let car = ElevatorCar::spawn(0, N_FLOORS, &config, Some(event_tx)).unwrap();
        (car, event_rx)
    }

    fn wait_quiescent(car: &ElevatorCar) {
        assert!(
            wait_until(TIMEOUT, || {
                let status = car.status();
                status.is_quiescent() && status.door == DoorState::Closed
            }),
            "car never went quiescent: {:?}",
            car.status()
        );
    }

    #[test]
    fn test_car_init() {
        // Purpose: Verify that a new car starts idle at floor 0 with the door closed

        // Arrange
        let (car, _event_rx) = setup_car(5, 5);

        // Act
        let status = car.status();

        // Assert
        assert_eq!(status.floor, 0);
        assert_eq!(status.state, CarState::Idle);
        assert_eq!(status.door, DoorState::Closed);
        assert_eq!(status.load_kg, 0);
        assert_eq!(status.pending, 0);
        assert!(!status.maintenance);
        assert!(!status.overloaded);

        car.shutdown();
    }

    #[test]
    fn test_car_drains_single_request() {
        // Purpose: Verify that a registered request is served and the car ends idle there

        // Arrange
        let (car, _event_rx) = setup_car(5, 5);

        // Act
        car.register_request(5);
        car.move_car();

        // Assert
        assert!(wait_until(TIMEOUT, || car.current_floor() == 5));
        wait_quiescent(&car);
        assert_eq!(car.state(), CarState::Idle);
        assert_eq!(car.current_floor(), 5);

        car.shutdown();
    }

    #[test]
    fn test_car_serves_requests_fifo() {
        // Purpose: Verify that targets are served in the order they were queued

        // Arrange
        let (car, event_rx) = setup_car(2, 2);

        // Act
        car.register_request(3);
        car.register_request(1);
        car.register_request(4);
        car.move_car();
        wait_quiescent(&car);

        // Assert
        let arrivals: Vec<u8> = event_rx
            .try_iter()
            .filter_map(|event| match event {
                CarEvent::Arrived { floor, .. } => Some(floor),
                _ => None,
            })
            .collect();
        assert_eq!(arrivals, vec![3, 1, 4]);
        assert_eq!(car.current_floor(), 4);

        car.shutdown();
    }

    #[test]
    fn test_car_keeps_direction_during_dwell_with_stops_queued() {
        // Purpose: Verify that a car dwelling at an intermediate stop still reports its travel direction

        // Arrange
        let (car, _event_rx) = setup_car(10, 400);
        car.register_request(3);
        car.register_request(6);

        // Act
        car.move_car();
        assert!(wait_until(TIMEOUT, || car.current_floor() == 3 && car.door().is_open()));

        // Assert
        let status = car.status();
        assert_eq!(status.state, CarState::Up);
        assert_eq!(car.pending_requests(), vec![6]);
        // Distance 2, no idle bonus, same-direction bonus
        assert_eq!(score(&status, &HallCall::new(5, Direction::Up)), -1);

        wait_quiescent(&car);
        assert_eq!(car.current_floor(), 6);

        car.shutdown();
    }

    #[test]
    fn test_car_idle_during_dwell_at_last_stop() {
        let (car, _event_rx) = setup_car(10, 400);

        car.register_request(2);
        car.move_car();
        assert!(wait_until(TIMEOUT, || car.current_floor() == 2 && car.door().is_open()));

        assert_eq!(car.state(), CarState::Idle);
        assert!(car.pending_requests().is_empty());

        car.shutdown();
    }

    #[test]
    fn test_car_request_at_current_floor_cycles_door() {
        // Purpose: Verify that a request for the current floor opens and closes the door without moving

        // Arrange
        let (car, event_rx) = setup_car(5, 5);

        // Act
        car.register_request(0);
        car.move_car();
        assert!(wait_until(TIMEOUT, || event_rx
            .try_iter()
            .any(|event| event == CarEvent::DoorClosed { car: 0, floor: 0 })));
        wait_quiescent(&car);

        // Assert
        assert_eq!(car.current_floor(), 0);
        assert_eq!(car.state(), CarState::Idle);
        assert!(!event_rx
            .try_iter()
            .any(|event| matches!(event, CarEvent::FloorStep { .. })));

        car.shutdown();
    }

    #[test]
    fn test_car_ignores_out_of_range_request() {
        let (car, _event_rx) = setup_car(5, 5);

        car.register_request(N_FLOORS);
        car.register_request(u8::MAX);
        car.move_car();

        assert!(car.pending_requests().is_empty());
        sleep(Duration::from_millis(50));
        assert_eq!(car.current_floor(), 0);

        car.shutdown();
    }

    #[test]
    fn test_car_maintenance_preempts_move() {
        // Purpose: Verify that maintenance halts an in-flight move at the reached floor and drops the queue

        // Arrange
        let (car, event_rx) = setup_car(40, 5);
        car.register_request(9);
        car.register_request(4);
        car.register_request(7);
        car.move_car();
        assert!(wait_until(TIMEOUT, || car.current_floor() >= 2));

        // Act
        car.enter_maintenance();
        let halted_at = car.current_floor();
        sleep(Duration::from_millis(200));

        // Assert
        let status = car.status();
        assert_eq!(status.state, CarState::Maintenance);
        assert!(status.maintenance);
        assert_eq!(status.door, DoorState::Open);
        assert_eq!(status.pending, 0);
        assert_eq!(status.target, None);
        assert_eq!(status.floor, halted_at);
        assert!(status.floor < 9);

        let events: Vec<CarEvent> = event_rx.try_iter().collect();
        assert!(events.contains(&CarEvent::MaintenanceEntered {
            car: 0,
            floor: halted_at,
            discarded: 2,
        }));
        assert!(events.contains(&CarEvent::Aborted {
            car: 0,
            floor: halted_at,
            target: 9,
        }));

        car.shutdown();
    }

    #[test]
    fn test_car_maintenance_during_dwell_keeps_door_open() {
        // Purpose: Verify that the end of a dwell does not close the door on a car in maintenance

        // Arrange
        let (car, _event_rx) = setup_car(5, 150);
        car.register_request(0);
        car.move_car();
        assert!(wait_until(TIMEOUT, || car.door().is_open()));

        // Act
        car.enter_maintenance();
        sleep(Duration::from_millis(300));

        // Assert
        assert_eq!(car.state(), CarState::Maintenance);
        assert_eq!(car.door().state(), DoorState::Open);

        car.shutdown();
    }

    #[test]
    fn test_car_exit_maintenance() {
        // Purpose: Verify that leaving maintenance closes the door and puts the car back in service

        // Arrange
        let (car, _event_rx) = setup_car(5, 5);
        car.enter_maintenance();

        // Act
        car.exit_maintenance();

        // Assert
        assert_eq!(car.state(), CarState::Idle);
        assert!(!car.is_in_maintenance());
        assert_eq!(car.door().state(), DoorState::Closed);

        car.register_request(2);
        car.move_car();
        assert!(wait_until(TIMEOUT, || car.current_floor() == 2));
        wait_quiescent(&car);

        car.shutdown();
    }

    #[test]
    fn test_car_ignores_requests_during_maintenance() {
        let (car, _event_rx) = setup_car(5, 5);
        car.enter_maintenance();

        car.register_request(3);
        car.move_car();
        sleep(Duration::from_millis(50));

        assert!(car.pending_requests().is_empty());
        assert_eq!(car.current_floor(), 0);
        assert_eq!(car.state(), CarState::Maintenance);

        car.shutdown();
    }

    #[test]
    fn test_car_emergency_stop() {
        // Purpose: Verify that an emergency stop behaves like entering maintenance

        // Arrange
        let (car, _event_rx) = setup_car(40, 5);
        car.register_request(8);
        car.move_car();
        assert!(wait_until(TIMEOUT, || car.current_floor() >= 1));

        // Act
        car.emergency_stop();
        let halted_at = car.current_floor();
        sleep(Duration::from_millis(150));

        // Assert
        assert_eq!(car.state(), CarState::Maintenance);
        assert!(car.door().is_open());
        assert!(car.pending_requests().is_empty());
        assert_eq!(car.current_floor(), halted_at);

        car.shutdown();
    }

    #[test]
    fn test_car_overload_blocks_departure() {
        // Purpose: Verify that an overloaded car does not depart until the load is back at the threshold

        // Arrange
        let (car, event_rx) = setup_car(5, 5);
        car.add_load(1001);
        assert!(car.is_overloaded());

        // Act
        car.register_request(3);
        car.move_car();
        assert!(wait_until(TIMEOUT, || event_rx
            .try_iter()
            .any(|event| matches!(event, CarEvent::Blocked { target: 3, .. }))));
        sleep(Duration::from_millis(50));

        // Assert
        assert_eq!(car.state(), CarState::Idle);
        assert_eq!(car.current_floor(), 0);
        assert_eq!(car.pending_requests(), vec![3]);

        // Exactly at the threshold is not overloaded
        car.remove_load(1);
        assert!(!car.is_overloaded());
        assert!(wait_until(TIMEOUT, || car.current_floor() == 3));
        wait_quiescent(&car);

        car.shutdown();
    }

    #[test]
    fn test_car_overload_aborts_transit() {
        // Purpose: Verify that overload mid-transit halts the car and the target is not resumed

        // Arrange
        let (car, event_rx) = setup_car(40, 5);
        car.register_request(9);
        car.move_car();
        assert!(wait_until(TIMEOUT, || car.current_floor() >= 2));

        // Act
        car.add_load(1500);
        let halted_at = car.current_floor();
        sleep(Duration::from_millis(200));

        // Assert
        assert_eq!(car.current_floor(), halted_at);
        assert_eq!(car.state(), CarState::Idle);
        assert!(car.pending_requests().is_empty());
        assert!(event_rx
            .try_iter()
            .any(|event| event == CarEvent::Aborted { car: 0, floor: halted_at, target: 9 }));

        car.remove_load(1500);
        sleep(Duration::from_millis(200));
        assert_eq!(car.current_floor(), halted_at);
        assert_eq!(car.state(), CarState::Idle);

        car.shutdown();
    }

    #[test]
    fn test_car_remove_load_clamps_at_zero() {
        let (car, _event_rx) = setup_car(5, 5);

        car.add_load(300);
        car.remove_load(500);

        assert_eq!(car.load_kg(), 0);
        assert!(!car.is_overloaded());

        car.add_load(1000);
        assert!(!car.is_overloaded());
        car.add_load(1);
        assert!(car.is_overloaded());

        car.shutdown();
    }

    #[test]
    fn test_car_single_flight_under_concurrent_triggers() {
        // Purpose: Verify that concurrent request/trigger storms never interleave floor steps

        // Arrange
        let (car, event_rx) = setup_car(1, 1);
        let n_threads = 8;
        let requests_per_thread = 10;

        // Act
        let handles: Vec<_> = (0..n_threads)
            .map(|t| {
                let car = car.clone();
                spawn(move || {
                    for i in 0..requests_per_thread {
                        car.register_request(((t * 3 + i * 7) % N_FLOORS as usize) as u8);
                        car.move_car();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(wait_until(Duration::from_secs(20), || {
            let status = car.status();
            status.is_quiescent() && status.door == DoorState::Closed
        }));

        // Assert
        let steps: Vec<(u8, u8)> = event_rx
            .try_iter()
            .filter_map(|event| match event {
                CarEvent::FloorStep { from, to, .. } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert!(!steps.is_empty());

        let mut position = 0u8;
        for (from, to) in steps {
            assert_eq!(from, position, "step did not start where the previous one ended");
            assert_eq!((to as i16 - from as i16).abs(), 1, "step skipped a floor");
            assert!(to < N_FLOORS);
            position = to;
        }
        assert_eq!(car.current_floor(), position);

        car.shutdown();
    }

    #[test]
    fn test_car_coalesces_triggers_while_busy() {
        // Purpose: Verify that a burst of triggers during a move is served as one drain with nothing lost

        // Arrange
        let (car, event_rx) = setup_car(20, 5);
        car.register_request(4);
        car.move_car();
        assert!(wait_until(TIMEOUT, || car.current_floor() >= 1));

        // Act
        car.register_request(2);
        for _ in 0..1000 {
            car.move_car();
        }
        wait_quiescent(&car);

        // Assert
        let arrivals: Vec<u8> = event_rx
            .try_iter()
            .filter_map(|event| match event {
                CarEvent::Arrived { floor, .. } => Some(floor),
                _ => None,
            })
            .collect();
        assert_eq!(arrivals, vec![4, 2]);
        assert_eq!(car.current_floor(), 2);
        assert!(car.pending_requests().is_empty());

        car.shutdown();
    }

    #[test]
    fn test_car_shutdown_stops_worker() {
        let (car, _event_rx) = setup_car(5, 5);

        car.shutdown();
        car.register_request(4);
        car.move_car();
        sleep(Duration::from_millis(50));

        assert_eq!(car.current_floor(), 0);
        assert_eq!(car.pending_requests(), vec![4]);
    }
}
