//! Board configuration parameters
//!
//! Compile-time limits shared by every module, plus the tunable
//! [`BoardConfig`] handed to the [`PumpBoard`](crate::app::service::PumpBoard)
//! at construction.  Nothing is persisted; the board boots with defaults.

use serde::{Deserialize, Serialize};

/// Number of switched pump outputs on the board.
pub const PUMP_COUNT: usize = 20;

/// Maximum number of ingredients in one recipe.
/// Doesn't need to be larger than the pump count.
pub const RECIPE_MAX_INGREDIENTS: usize = 20;

/// Number of pump-driver fault sense banks.
pub const FAULT_BANK_COUNT: usize = 3;

/// Identity printed by the version command and the boot banner.
pub const TARGET_ID: &str = "pumpboard";
pub const VERSION_ID: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR_ID: &str = "PumpBoard Engineering";

/// Prefix every console command must start with (may be empty).
pub const COMMAND_PREFIX: &str = "";
/// Prompt printed before each console line.
pub const COMMANDLINE_PROMPT: &str = "?> ";

/// Tunable board configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    // --- Cleaning ---
    /// Pause between switching consecutive pumps during a clean cycle (ms)
    pub clean_step_delay_ms: u32,

    // --- Timing ---
    /// Period of the system tick interrupt (microseconds)
    pub tick_period_us: u64,
    /// Heartbeat LED toggle interval (milliseconds)
    pub heartbeat_interval_ms: u64,

    // --- Console ---
    /// Console UART baud rate
    pub uart_baud: u32,
    /// Echo received console bytes back to the operator
    pub serial_echo: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            // Switch all pumps in the span of one second when cleaning
            clean_step_delay_ms: 1000 / PUMP_COUNT as u32,

            // Timing
            tick_period_us: 1_000, // 1 kHz
            heartbeat_interval_ms: 500,

            // Console
            uart_baud: 38_400,
            serial_echo: true,
        }
    }
}
