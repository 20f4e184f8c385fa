//! On-board status LEDs.
//!
//! Two discrete LEDs, wired active LOW:
//! - heartbeat, toggled by the main loop
//! - activity, lit while any pump output is energized
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` output pins: raw GPIOs on ESP-IDF, mock pins
//! on the host.

use embedded_hal::digital::OutputPin;

use crate::actuator::{PumpId, PumpMask};
use crate::app::ports::StatusLightPort;

pub struct StatusLed<O> {
    pin: O,
    lit: bool,
}

impl<O: OutputPin> StatusLed<O> {
    /// Takes the pin and switches the LED off.
    pub fn new(pin: O) -> Self {
        let mut led = Self { pin, lit: true };
        led.off();
        led
    }

    pub fn set(&mut self, lit: bool) {
        // Pin errors only cost us a wrong LED state.
        let _ = if lit { self.pin.set_low() } else { self.pin.set_high() };
        self.lit = lit;
    }

    pub fn on(&mut self) {
        self.set(true);
    }

    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        self.set(!self.lit);
    }

    pub fn is_on(&self) -> bool {
        self.lit
    }

    pub fn pin(&self) -> &O {
        &self.pin
    }
}

/// Mirrors pump activity onto one LED.
pub struct ActivityLight<O> {
    led: StatusLed<O>,
    active: PumpMask,
}

impl<O: OutputPin> ActivityLight<O> {
    pub fn new(pin: O) -> Self {
        Self {
            led: StatusLed::new(pin),
            active: PumpMask::EMPTY,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.led.is_on()
    }

    pub fn active(&self) -> PumpMask {
        self.active
    }
}

impl<O: OutputPin> StatusLightPort for ActivityLight<O> {
    fn pump_changed(&mut self, id: PumpId, on: bool) {
        if on {
            self.active.insert(id);
        } else {
            self.active.remove(id);
        }
        let lit = !self.active.is_empty();
        if lit != self.led.is_on() {
            self.led.set(lit);
        }
    }
}
