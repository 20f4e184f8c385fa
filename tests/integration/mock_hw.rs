//! Mock hardware adapters for integration tests.
//!
//! Records every pump and light call so tests can assert on the full
//! switching history without touching real GPIO registers, and provides a
//! delay that advances the board clock instead of sleeping.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};

use pumpboard::actuator::PumpId;
use pumpboard::app::events::BoardEvent;
use pumpboard::app::ports::{EventSink, PumpPort, StatusLightPort};
use pumpboard::app::service::PumpBoard;
use pumpboard::clock::Tick;
use pumpboard::config::{BoardConfig, PUMP_COUNT};
use pumpboard::safety::FaultBank;

// ── Pump outputs ──────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingPumps {
    pub level: [bool; PUMP_COUNT],
    /// Every write as `(pump id, on)`, oldest first.
    pub history: Vec<(u8, bool)>,
}

#[allow(dead_code)]
impl RecordingPumps {
    pub fn is_on(&self, pump: u8) -> bool {
        self.level[usize::from(pump - 1)]
    }

    pub fn on_count(&self) -> usize {
        self.level.iter().filter(|on| **on).count()
    }

    /// Pumps switched on at or after history index `from`.
    pub fn energized_since(&self, from: usize) -> Vec<u8> {
        self.history[from..]
            .iter()
            .filter(|(_, on)| *on)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl PumpPort for RecordingPumps {
    fn write_pump(&mut self, id: PumpId, on: bool) {
        self.level[id.index()] = on;
        self.history.push((id.get(), on));
    }
}

// ── Status lights ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingLights {
    pub changes: Vec<(u8, bool)>,
}

impl StatusLightPort for RecordingLights {
    fn pump_changed(&mut self, id: PumpId, on: bool) {
        self.changes.push((id.get(), on));
    }
}

// ── Output pin ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
pub struct MockPin {
    pub high: bool,
    pub writes: u32,
    /// When set, every write fails without changing the level.
    pub broken: bool,
}

#[allow(dead_code)]
impl MockPin {
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.writes += 1;
        if self.broken {
            return Err(MockPinError);
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.writes += 1;
        if self.broken {
            return Err(MockPinError);
        }
        self.high = true;
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<BoardEvent>,
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &BoardEvent) {
        self.events.push(*event);
    }
}

// ── Ticking delay ─────────────────────────────────────────────

/// Advances the board one tick per millisecond of requested delay, so
/// blocking operations (`go`, `clean`) run to completion in tests.
/// Optionally asserts a fault bank at a given tick.
pub struct TickingDelay<'a, P, L> {
    board: &'a PumpBoard<P, L>,
    fault_at: Option<(Tick, FaultBank)>,
    ns_carry: u32,
    pub ticks: u64,
}

#[allow(dead_code)]
impl<'a, P: PumpPort, L: StatusLightPort> TickingDelay<'a, P, L> {
    pub fn new(board: &'a PumpBoard<P, L>) -> Self {
        Self {
            board,
            fault_at: None,
            ns_carry: 0,
            ticks: 0,
        }
    }

    pub fn with_fault_at(mut self, at: Tick, bank: FaultBank) -> Self {
        self.fault_at = Some((at, bank));
        self
    }

    fn tick(&mut self) {
        self.board.on_tick();
        self.ticks += 1;
        if let Some((at, bank)) = self.fault_at {
            if self.board.now() == at {
                self.board.on_fault(bank);
            }
        }
    }
}

impl<P: PumpPort, L: StatusLightPort> DelayNs for TickingDelay<'_, P, L> {
    fn delay_ns(&mut self, ns: u32) {
        self.ns_carry += ns;
        while self.ns_carry >= 1_000_000 {
            self.ns_carry -= 1_000_000;
            self.tick();
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.tick();
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────

pub type TestBoard = PumpBoard<RecordingPumps, RecordingLights>;

pub fn make_board() -> TestBoard {
    PumpBoard::new(
        BoardConfig::default(),
        RecordingPumps::default(),
        RecordingLights::default(),
    )
}

/// Advance the board `ms` ticks.
#[allow(dead_code)]
pub fn run_for<P: PumpPort, L: StatusLightPort>(board: &PumpBoard<P, L>, ms: u64) {
    for _ in 0..ms {
        board.on_tick();
    }
}

/// Stage and store one ingredient.
#[allow(dead_code)]
pub fn add_ingredient(board: &TestBoard, pump: u16, duration_ms: u16, delay_ms: u16) {
    board.set_pump(pump).unwrap();
    board.set_duration(duration_ms).unwrap();
    if delay_ms > 0 {
        board.set_delay(delay_ms).unwrap();
    }
    board.store().unwrap();
}

#[allow(dead_code)]
pub fn pump_is_on(board: &TestBoard, pump: u8) -> bool {
    board.with_pumps(|p| p.is_on(pump))
}

#[allow(dead_code)]
pub fn drain(board: &TestBoard) -> Vec<BoardEvent> {
    let mut log = EventLog::default();
    board.drain_events(|e| log.emit(&e));
    log.events
}
