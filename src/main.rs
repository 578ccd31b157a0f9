/* 3rd party libraries */
use clap::{Arg, Command};
use log::info;
use rand::Rng;
use std::thread::sleep;
use std::time::{Duration, Instant};

/* Custom libraries */
use elevator_dispatch::config;
use elevator_dispatch::panel::HallPanel;
use elevator_dispatch::unwrap_or_exit;
use elevator_dispatch::{Direction, ElevatorSystem};

/* Main */
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("elevator_dispatch")
        .about("Multi-car elevator dispatch demo")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .default_value("config.toml")
                .help("Path to the TOML configuration file"),
        )
        .arg(
            Arg::new("scenario")
                .long("scenario")
                .short('s')
                .takes_value(true)
                .possible_values(["maintenance", "reposition", "all"])
                .default_value("all")
                .help("Demo scenario to run"),
        )
        .get_matches();

    // Load the configuration
    let config_path = matches.value_of("config").unwrap_or("config.toml");
    let config = unwrap_or_exit!(config::load_config(config_path), "load configuration");

    // Start the cars and the dispatcher
    let system = unwrap_or_exit!(ElevatorSystem::new(&config), "start the elevator system");
    let panels: Vec<HallPanel> = (0..system.n_floors())
        .map(|floor| HallPanel::new(floor, system.n_floors()))
        .collect();

    let scenario = matches.value_of("scenario").unwrap_or("all");
    if scenario == "maintenance" || scenario == "all" {
        scenario_maintenance(&system, &panels);
    }
    if scenario == "reposition" || scenario == "all" {
        scenario_reposition(&system, &panels);
    }

    println!("{}", unwrap_or_exit!(system.monitoring_json(), "render the status snapshot"));

    system.shutdown();
}

fn scenario_maintenance(system: &ElevatorSystem, panels: &[HallPanel]) {
    let Some(last_car) = system.cars().last() else {
        return;
    };
    let call_floor = 7u8.min(system.n_floors() - 1);

    info!(
        "=== Scenario 1: Elevator {} in maintenance, passenger calls elevator from floor {} ===",
        last_car.id() + 1,
        call_floor
    );
    print_monitoring(system);

    last_car.enter_maintenance();
    print_monitoring(system);

    run_call(system, panels, call_floor, Direction::Up);
    wait_for_quiescence(system, Duration::from_secs(10));

    last_car.exit_maintenance();
    info!("--- Resetting maintenance for all elevators ---");
    print_monitoring(system);
}

fn scenario_reposition(system: &ElevatorSystem, panels: &[HallPanel]) {
    info!("=== Scenario 2: Random positions, passenger calls elevator from ground (0) ===");

    let mut rng = rand::thread_rng();
    for car in system.cars() {
        let floor = rng.gen_range(0..system.n_floors());
        info!("→ Sending Elevator {} to floor {}", car.id() + 1, floor);
        car.register_request(floor);
        car.move_car();
    }
    wait_for_quiescence(system, Duration::from_secs(10));

    info!("Elevator positions after random repositioning:");
    for status in system.monitoring() {
        info!("Elevator {} ► Floor: {} | State: {:?}", status.id + 1, status.floor, status.state);
    }

    run_call(system, panels, 0, Direction::Up);
    wait_for_quiescence(system, Duration::from_secs(10));
    print_monitoring(system);
}

fn run_call(system: &ElevatorSystem, panels: &[HallPanel], floor: u8, direction: Direction) {
    info!("Passenger calls lift on floor {} ({:?})", floor, direction);
    match system.nearest_idle_car(floor) {
        Some(car) => info!(
            "→ Nearest idle elevator is {} at floor {}",
            car.id() + 1,
            car.current_floor()
        ),
        None => info!("No idle elevator available right now. Dispatcher will queue the call."),
    }

    let Some(panel) = panels.get(floor as usize) else {
        return;
    };
    // The top floor only has a down button
    let direction = if panel.button(direction).is_some() {
        direction
    } else {
        Direction::Down
    };
    panel.press(direction, system);

    info!("[Status after dispatch attempt]");
    print_monitoring(system);
}

fn wait_for_quiescence(system: &ElevatorSystem, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    // Give the dispatcher a moment to pick up anything just submitted
    sleep(Duration::from_millis(50));
    while Instant::now() < deadline {
        let busy = system
            .monitoring()
            .iter()
            .any(|status| !status.maintenance && !status.is_quiescent());
        if !busy {
            return;
        }
        sleep(Duration::from_millis(50));
    }
}

fn print_monitoring(system: &ElevatorSystem) {
    info!("=== System Monitoring ===");
    for status in system.monitoring() {
        info!("{}", status);
    }
    info!("=========================");
}
