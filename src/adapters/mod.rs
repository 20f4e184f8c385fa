//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to        |
//! |------------|------------|--------------------|
//! | `log_sink` | EventSink  | Serial log output  |
//!
//! The pump and light ports are implemented directly by
//! [`drivers::pump`](crate::drivers::pump) and
//! [`drivers::status_led`](crate::drivers::status_led).

pub mod log_sink;
