//! PumpBoard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

#[cfg(all(target_os = "espidf", not(feature = "espidf")))]
compile_error!("building for ESP-IDF requires the `espidf` feature");

pub mod actuator;
pub mod app;
pub mod clock;
pub mod config;
pub mod deadline;
pub mod dispense;
pub mod error;
pub mod events;
pub mod pins;
pub mod recipe;
pub mod safety;

// The drivers compile on every target; the actual register access is
// guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
