//! Pump-driver fault sense lines.
//!
//! Each [`FaultBank`] has one open-drain, wired-OR sense line.  The GPIO
//! interrupt only calls [`FaultLines::raise`], which latches the bank in an
//! atomic bitmask.  The latched banks are handed to their registered
//! handlers by [`FaultLines::dispatch`], which the tick callback runs before
//! advancing the clock, so a fault is acted on within one millisecond.
//! The ISR also pulls every pump pin low directly, so for that window the
//! board state lags the hardware: it still reports the run as active.
//!
//! ```text
//!  sense ISR ──raise──▶ pending (AtomicU8) ──dispatch──▶ handler(bank)
//! ```

use core::cell::Cell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;

use crate::config::FAULT_BANK_COUNT;
use crate::safety::FaultBank;

/// Called once per dispatched fault.
pub type FaultHandler = fn(FaultBank);

/// Sense lines of the board, shared with the GPIO interrupt.
pub static FAULT_LINES: FaultLines = FaultLines::new();

pub struct FaultLines {
    handlers: Mutex<Cell<[Option<FaultHandler>; FAULT_BANK_COUNT]>>,
    pending: AtomicU8,
}

impl Default for FaultLines {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultLines {
    pub const fn new() -> Self {
        Self {
            handlers: Mutex::new(Cell::new([None; FAULT_BANK_COUNT])),
            pending: AtomicU8::new(0),
        }
    }

    /// Attach `handler` to `bank`, replacing any previous one.
    pub fn register(&self, bank: FaultBank, handler: FaultHandler) {
        critical_section::with(|cs| {
            let cell = self.handlers.borrow(cs);
            let mut table = cell.get();
            table[bank.index()] = Some(handler);
            cell.set(table);
        });
    }

    /// Latch a fault.  Lock-free; safe from interrupt context.
    pub fn raise(&self, bank: FaultBank) {
        self.pending.fetch_or(bank.mask(), Ordering::AcqRel);
    }

    /// Run the handlers of every latched bank and clear the latch.
    /// Returns the bitmask that was dispatched.  A latched bank without a
    /// handler is cleared silently.
    pub fn dispatch(&self) -> u8 {
        let latched = self.pending.swap(0, Ordering::AcqRel);
        if latched == 0 {
            return 0;
        }

        let table = critical_section::with(|cs| self.handlers.borrow(cs).get());
        for bank in FaultBank::ALL {
            if latched & bank.mask() == 0 {
                continue;
            }
            if let Some(handler) = table[bank.index()] {
                handler(bank);
            }
        }
        latched
    }

    /// Raise and dispatch in one step.
    pub fn signal(&self, bank: FaultBank) {
        self.raise(bank);
        self.dispatch();
    }

    /// Banks latched but not yet dispatched.
    pub fn pending(&self) -> u8 {
        self.pending.load(Ordering::Acquire)
    }
}
