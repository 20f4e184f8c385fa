//! Fault monitor.
//!
//! The pump drivers are grouped into fault banks that share one open-drain
//! sense line.  When any driver in a bank reports an error its line is
//! pulled low and [`FaultMonitor::on_fault`] runs:
//!
//! 1. Every pump output is driven off, all 20 of them, regardless of what
//!    the run state believes is energized.
//! 2. The dispense run is marked as no longer running.
//! 3. The bank is latched in the fault bitmask for reporting.
//!
//! There is no recovery beyond the forced shutdown.  The operator has to
//! issue the recipe again.  The run's stop markers and any armed deadline
//! are left alone (see [`DispenseScheduler::abort`]).
//!
//! [`DispenseScheduler::abort`]: crate::dispense::DispenseScheduler::abort

use core::fmt;
use core::ops::RangeInclusive;

use log::warn;

use crate::actuator::{Actuator, PumpId};
use crate::app::ports::{PumpPort, StatusLightPort};
use crate::config::FAULT_BANK_COUNT;
use crate::dispense::DispenseScheduler;

/// A group of pump drivers sharing one fault sense line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultBank {
    /// Pumps 1–8.
    Bank0 = 0b0000_0001,
    /// Pumps 9–16.
    Bank1 = 0b0000_0010,
    /// Pumps 17–20.
    Bank2 = 0b0000_0100,
}

impl FaultBank {
    pub const ALL: [FaultBank; FAULT_BANK_COUNT] = [Self::Bank0, Self::Bank1, Self::Bank2];

    /// Bitmask for this bank.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Bank0 => 0,
            Self::Bank1 => 1,
            Self::Bank2 => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Pump ids covered by this bank.
    pub const fn pumps(self) -> RangeInclusive<u8> {
        match self {
            Self::Bank0 => 1..=8,
            Self::Bank1 => 9..=16,
            Self::Bank2 => 17..=20,
        }
    }

    pub fn for_pump(id: PumpId) -> Self {
        match id.get() {
            1..=8 => Self::Bank0,
            9..=16 => Self::Bank1,
            _ => Self::Bank2,
        }
    }
}

impl fmt::Display for FaultBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pumps = self.pumps();
        write!(
            f,
            "bank {} (pumps {}-{})",
            self.index(),
            pumps.start(),
            pumps.end()
        )
    }
}

/// Latches which banks have reported since boot (or the last clear).
#[derive(Debug, Default)]
pub struct FaultMonitor {
    faults: u8,
    count: u32,
}

impl FaultMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forced shutdown.  Runs with interrupts masked; must not log.
    pub fn on_fault<P: PumpPort, L: StatusLightPort>(
        &mut self,
        bank: FaultBank,
        actuator: &mut Actuator<P, L>,
        scheduler: &mut DispenseScheduler,
    ) {
        actuator.all_off();
        scheduler.abort();
        self.faults |= bank.mask();
        self.count = self.count.saturating_add(1);
    }

    /// Latched fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    pub fn has_fault(&self, bank: FaultBank) -> bool {
        self.faults & bank.mask() != 0
    }

    /// Total fault signals handled since boot.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Forget latched banks.  The outputs are not touched.
    pub fn clear(&mut self) {
        if self.faults != 0 {
            warn!("clearing latched faults 0b{:03b}", self.faults);
        }
        self.faults = 0;
    }
}
