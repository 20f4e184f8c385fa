//! Application core: pure domain logic, zero I/O.
//!
//! This module wires the timing, recipe and safety pieces into one
//! [`PumpBoard`](service::PumpBoard) and exposes it to the operator through
//! the serial [`console`].  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod console;
pub mod events;
pub mod ports;
pub mod service;
