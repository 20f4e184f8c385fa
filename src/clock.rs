//! Millisecond system time.
//!
//! [`SystemClock::advance`] is called once per tick interrupt (1 kHz) and is
//! the only writer.  Everything else reads [`SystemClock::now`].  The counter
//! is 64 bits wide and never resets, so wraparound is not a concern.
//!
//! The counter lives behind a critical-section mutex because 64-bit loads
//! are not atomic on the targets this firmware runs on.

use core::cell::Cell;

use embassy_sync::blocking_mutex::CriticalSectionMutex;

/// Milliseconds since power-on.
pub type Tick = u64;

pub struct SystemClock {
    ticks: CriticalSectionMutex<Cell<Tick>>,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub const fn new() -> Self {
        Self {
            ticks: CriticalSectionMutex::new(Cell::new(0)),
        }
    }

    /// Current tick.
    pub fn now(&self) -> Tick {
        self.ticks.lock(Cell::get)
    }

    /// Advance by exactly one tick and return the new value.
    /// Tick interrupt only.
    pub fn advance(&self) -> Tick {
        self.ticks.lock(|ticks| {
            let next = ticks.get() + 1;
            ticks.set(next);
            next
        })
    }

    /// Milliseconds elapsed since `earlier`.
    pub fn elapsed_since(&self, earlier: Tick) -> u64 {
        self.now().saturating_sub(earlier)
    }
}
