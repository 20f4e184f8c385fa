//! Outbound board events.
//!
//! Produced from both interrupt and main-loop context, buffered in the
//! [`EventQueue`](crate::events::EventQueue), and drained by the main loop
//! into an [`EventSink`](super::ports::EventSink).

use crate::clock::Tick;
use crate::safety::FaultBank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// All recipe pumps were energized.
    DispenseStarted { ingredients: u8, at: Tick },
    /// The last recipe pump was switched off.
    DispenseCompleted { at: Tick, elapsed_ms: u32 },
    /// A driver fault bank asserted its sense line; all pumps were forced off.
    FaultReported { bank: FaultBank, at: Tick },
    /// A clean sweep switched every pump on.
    CleanStarted,
    /// A clean sweep switched every pump off.
    CleanStopped,
}
