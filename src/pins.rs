//! GPIO / peripheral pin assignments for the pump board (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

use crate::config::{FAULT_BANK_COUNT, PUMP_COUNT};

// ---------------------------------------------------------------------------
// Pump outputs (20 high-side drivers, active HIGH)
// ---------------------------------------------------------------------------

/// Pump P01 – P20, in pump-id order.
pub const PUMP_GPIOS: [i32; PUMP_COUNT] = [
    1, 2, 3, 4, 5, 6, 7, 8, // P01 – P08 (bank 0)
    9, 10, 11, 12, 13, 14, 15, 16, // P09 – P16 (bank 1)
    17, 18, 21, 38, // P17 – P20 (bank 2)
];

// ---------------------------------------------------------------------------
// Driver fault sense lines (open-drain, wired-OR per bank, active LOW)
// ---------------------------------------------------------------------------

/// One interrupt line per fault bank.  External pull-ups; a driver pulls
/// its bank line low on error and releases it when its input goes low.
pub const SENSE_BANK_GPIOS: [i32; FAULT_BANK_COUNT] = [39, 40, 41];

// ---------------------------------------------------------------------------
// On-board status LEDs (active LOW)
// ---------------------------------------------------------------------------

/// Toggled every heartbeat interval by the main loop.
pub const HEARTBEAT_LED_GPIO: i32 = 47;
/// Lit while any pump output is energized.
pub const DISPENSE_LED_GPIO: i32 = 48;

// ---------------------------------------------------------------------------
// UART console (UART0, USB-serial bridge)
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 43;
pub const UART_RX_GPIO: i32 = 44;
