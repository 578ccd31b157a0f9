/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::elevator::ElevatorCar;
use crate::shared::Direction;
use crate::system::ElevatorSystem;

/***************************************/
/*             Public API              */
/***************************************/

/// Pressed/released flag of one physical button.
#[derive(Debug, Default)]
pub struct Button {
    pressed: AtomicBool,
}

impl Button {
    pub fn new() -> Button {
        Button::default()
    }

    pub fn press(&self) {
        self.pressed.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.pressed.store(false, Ordering::SeqCst);
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::SeqCst)
    }
}

/// Up/down call buttons on one floor. The top floor has no up button and the
/// ground floor no down button.
#[derive(Debug)]
pub struct HallPanel {
    floor: u8,
    up: Option<Button>,
    down: Option<Button>,
}

impl HallPanel {
    pub fn new(floor: u8, n_floors: u8) -> HallPanel {
        HallPanel {
            floor,
            up: (floor < n_floors.saturating_sub(1)).then(Button::new),
            down: (floor > 0).then(Button::new),
        }
    }

    pub fn floor(&self) -> u8 {
        self.floor
    }

    pub fn button(&self, direction: Direction) -> Option<&Button> {
        match direction {
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
        }
    }

    /// Presses the button and submits the hall call. Does nothing if the panel
    /// has no button for `direction`.
    pub fn press(&self, direction: Direction, system: &ElevatorSystem) {
        match self.button(direction) {
            Some(button) => {
                button.press();
                system.submit_call(self.floor, direction);
            }
            None => debug!("Floor {} has no {:?} button", self.floor, direction),
        }
    }

    pub fn reset(&self, direction: Direction) {
        if let Some(button) = self.button(direction) {
            button.reset();
        }
    }
}

/// Buttons inside a car: one per floor plus the emergency button.
#[derive(Debug)]
pub struct CarPanel {
    floor_buttons: Vec<Button>,
    emergency: Button,
}

impl CarPanel {
    pub fn new(n_floors: u8) -> CarPanel {
        CarPanel {
            floor_buttons: (0..n_floors).map(|_| Button::new()).collect(),
            emergency: Button::new(),
        }
    }

    pub fn floor_button(&self, floor: u8) -> Option<&Button> {
        self.floor_buttons.get(floor as usize)
    }

    pub fn emergency_button(&self) -> &Button {
        &self.emergency
    }

    /// In-car destination request.
    pub fn press_floor(&self, floor: u8, car: &ElevatorCar) {
        if let Some(button) = self.floor_button(floor) {
            button.press();
            if car.register_request(floor) {
                car.move_car();
            }
        }
    }

    pub fn press_emergency(&self, car: &ElevatorCar) {
        self.emergency.press();
        car.emergency_stop();
    }

    pub fn release_emergency(&self, car: &ElevatorCar) {
        self.emergency.reset();
        car.exit_maintenance();
    }
}
