//! Pump output bank.
//!
//! Twenty high-side switches, one GPIO each, active HIGH.  Implements
//! [`PumpPort`] over any `embedded-hal` output pin so the same driver runs
//! on the board's raw GPIOs and on mock pins in tests.
//!
//! ## Safety contract
//!
//! This driver is a dumb actuator.  Deciding when a pump may run is the
//! job of the dispense scheduler and the fault monitor.

use embedded_hal::digital::OutputPin;

use crate::actuator::PumpId;
use crate::app::ports::PumpPort;
use crate::config::PUMP_COUNT;

pub struct PumpBank<O> {
    outputs: [O; PUMP_COUNT],
    failed_writes: u32,
}

impl<O: OutputPin> PumpBank<O> {
    /// Takes the outputs in pump-id order and drives them all low.
    pub fn new(outputs: [O; PUMP_COUNT]) -> Self {
        let mut bank = Self {
            outputs,
            failed_writes: 0,
        };
        for id in PumpId::all() {
            bank.write_pump(id, false);
        }
        bank
    }

    /// Pin writes that reported an error since boot.
    pub fn failed_writes(&self) -> u32 {
        self.failed_writes
    }

    pub fn output(&self, id: PumpId) -> &O {
        &self.outputs[id.index()]
    }
}

impl<O: OutputPin> PumpPort for PumpBank<O> {
    fn write_pump(&mut self, id: PumpId, on: bool) {
        let pin = &mut self.outputs[id.index()];
        let result = if on { pin.set_high() } else { pin.set_low() };
        if result.is_err() {
            self.failed_writes = self.failed_writes.saturating_add(1);
        }
    }
}
