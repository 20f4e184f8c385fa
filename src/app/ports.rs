//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PumpBoard (domain)
//! ```
//!
//! Driven adapters (pump outputs, indicator lights, event sinks) implement
//! these traits.  The [`PumpBoard`](super::service::PumpBoard) consumes them
//! via generics, so the domain core never touches hardware directly.
//!
//! [`PumpPort`] and [`StatusLightPort`] are called from inside critical
//! sections, including the tick interrupt.  Implementations must not block,
//! allocate or log.

use crate::actuator::PumpId;

use super::events::BoardEvent;

// ───────────────────────────────────────────────────────────────
// Pump port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: drives one physical pump output.
pub trait PumpPort {
    /// Drive the output for `id` on or off.  Must be idempotent.
    fn write_pump(&mut self, id: PumpId, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Status light port (driven adapter: domain → indicators)
// ───────────────────────────────────────────────────────────────

/// Notified after every pump output change.  Visual feedback only.
pub trait StatusLightPort {
    fn pump_changed(&mut self, id: PumpId, on: bool);
}

/// No indicator attached.
impl StatusLightPort for () {
    fn pump_changed(&mut self, _id: PumpId, _on: bool) {}
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The main loop drains [`BoardEvent`]s into this port.  Adapters decide
/// where they go (serial log, test recorder, ...).
pub trait EventSink {
    fn emit(&mut self, event: &BoardEvent);
}
