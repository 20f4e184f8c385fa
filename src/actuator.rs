//! Pump actuator.
//!
//! Maps logical pump ids (1–20) onto the [`PumpPort`] outputs and keeps a
//! mirror of which outputs are energized.  Every state change is also
//! forwarded to the [`StatusLightPort`] for visual feedback; the lights are
//! never consulted for decisions.
//!
//! The actuator does not know about recipes, timers or faults.  It is a
//! dumb output stage: callers decide *when* to switch, this module only
//! guarantees that an invalid id never reaches the hardware.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::ports::{PumpPort, StatusLightPort};
use crate::config::PUMP_COUNT;
use crate::error::{Result, ValidationError};

// ───────────────────────────────────────────────────────────────
// PumpId
// ───────────────────────────────────────────────────────────────

/// A validated pump id in `1..=PUMP_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct PumpId(u8);

impl PumpId {
    pub fn new(raw: u16) -> Result<Self> {
        if raw == 0 || raw as usize > PUMP_COUNT {
            return Err(ValidationError::InvalidPumpId(raw).into());
        }
        Ok(Self(raw as u8))
    }

    /// 1-based id as printed to the operator.
    pub fn get(self) -> u8 {
        self.0
    }

    /// 0-based index into per-pump tables.
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// Every pump on the board, in id order.
    pub fn all() -> impl Iterator<Item = PumpId> {
        (1..=PUMP_COUNT as u8).map(PumpId)
    }
}

impl TryFrom<u16> for PumpId {
    type Error = crate::error::Error;

    fn try_from(raw: u16) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<PumpId> for u16 {
    fn from(id: PumpId) -> Self {
        u16::from(id.0)
    }
}

impl fmt::Display for PumpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// PumpMask
// ───────────────────────────────────────────────────────────────

/// Set of pumps, one bit per pump (bit 0 = pump 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpMask(u32);

impl PumpMask {
    pub const EMPTY: Self = Self(0);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits & ((1 << PUMP_COUNT) - 1))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn insert(&mut self, id: PumpId) {
        self.0 |= 1 << id.index();
    }

    pub fn remove(&mut self, id: PumpId) {
        self.0 &= !(1 << id.index());
    }

    pub fn contains(self, id: PumpId) -> bool {
        self.0 & (1 << id.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = PumpId> {
        PumpId::all().filter(move |id| self.contains(*id))
    }
}

impl FromIterator<PumpId> for PumpMask {
    fn from_iter<I: IntoIterator<Item = PumpId>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for id in iter {
            mask.insert(id);
        }
        mask
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator
// ───────────────────────────────────────────────────────────────

pub struct Actuator<P, L> {
    pumps: P,
    lights: L,
    energized: PumpMask,
}

impl<P: PumpPort, L: StatusLightPort> Actuator<P, L> {
    pub fn new(pumps: P, lights: L) -> Self {
        Self {
            pumps,
            lights,
            energized: PumpMask::EMPTY,
        }
    }

    /// Validate `raw` and switch that pump.  An invalid id performs no
    /// hardware change.
    pub fn set_pump(&mut self, raw: u16, on: bool) -> Result<PumpId> {
        let id = PumpId::new(raw)?;
        self.set(id, on);
        Ok(id)
    }

    pub fn set(&mut self, id: PumpId, on: bool) {
        self.pumps.write_pump(id, on);
        if on {
            self.energized.insert(id);
        } else {
            self.energized.remove(id);
        }
        self.lights.pump_changed(id, on);
    }

    /// Drive every output off, whatever the recorded state says.
    pub fn all_off(&mut self) {
        for id in PumpId::all() {
            self.set(id, false);
        }
    }

    pub fn is_on(&self, id: PumpId) -> bool {
        self.energized.contains(id)
    }

    /// Pumps currently commanded on.
    pub fn energized(&self) -> PumpMask {
        self.energized
    }

    pub fn pumps(&self) -> &P {
        &self.pumps
    }

    pub fn lights(&self) -> &L {
        &self.lights
    }
}
