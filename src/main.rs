//! PumpBoard Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Drivers (outer ring)                      │
//! │                                                                │
//! │  PumpBank       ActivityLight   FaultLines    tick timer       │
//! │  (PumpPort)     (LightPort)     (sense ISR)   (1 ms)           │
//! │  UART console   LogEventSink                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              PumpBoard (pure logic)                    │    │
//! │  │  clock · deadline · dispense · faults · recipe         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::OnceLock;

use anyhow::Result;
use esp_idf_hal::delay::{FreeRtos, NON_BLOCK};
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use pumpboard::adapters::log_sink::LogEventSink;
use pumpboard::app::console::Console;
use pumpboard::app::ports::EventSink;
use pumpboard::app::service::PumpBoard;
use pumpboard::config::{BoardConfig, TARGET_ID, VERSION_ID};
use pumpboard::drivers::hw_init::{self, RawOutput};
use pumpboard::drivers::hw_timer;
use pumpboard::drivers::pump::PumpBank;
use pumpboard::drivers::sense::FAULT_LINES;
use pumpboard::drivers::status_led::{ActivityLight, StatusLed};
use pumpboard::pins;
use pumpboard::safety::FaultBank;

type Board = PumpBoard<PumpBank<RawOutput>, ActivityLight<RawOutput>>;

static BOARD: OnceLock<Board> = OnceLock::new();

// ── Interrupt glue ────────────────────────────────────────────

fn on_fault(bank: FaultBank) {
    if let Some(board) = BOARD.get() {
        board.on_fault(bank);
    }
}

/// 1 ms esp_timer callback.  Latched faults are handled before the clock
/// moves, so a stop deadline never outruns a pending fault.
unsafe extern "C" fn on_tick_timer(_arg: *mut core::ffi::c_void) {
    FAULT_LINES.dispatch();
    if let Some(board) = BOARD.get() {
        board.on_tick();
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  {} v{}                    ║", TARGET_ID, VERSION_ID);
    info!("╚══════════════════════════════════════╝");

    let config = BoardConfig::default();

    // ── 2. Outputs first, so every pump is off before anything else ──
    hw_init::init_peripherals()?;

    let board = BOARD.get_or_init(|| {
        PumpBoard::new(
            config.clone(),
            PumpBank::new(pins::PUMP_GPIOS.map(RawOutput::new)),
            ActivityLight::new(RawOutput::new(pins::DISPENSE_LED_GPIO)),
        )
    });

    // ── 3. Fault path ─────────────────────────────────────────
    for bank in FaultBank::ALL {
        FAULT_LINES.register(bank, on_fault);
    }
    hw_init::init_isr_service()?;

    // ── 4. Tick ───────────────────────────────────────────────
    hw_timer::start_tick_timer(config.tick_period_us, on_tick_timer)?;

    // ── 5. Console ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let mut uart = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio43,
        peripherals.pins.gpio44,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(config.uart_baud)),
    )?;

    let mut console = Console::new(config.serial_echo);
    let mut heartbeat = StatusLed::new(RawOutput::new(pins::HEARTBEAT_LED_GPIO));
    let mut log_sink = LogEventSink::new();
    let mut delay = FreeRtos;
    let mut last_beat = board.now();
    let mut reported_drops = 0;

    info!("ready!");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        console.prompt(&mut uart)?;

        let mut byte = [0u8; 1];
        match uart.read(&mut byte, NON_BLOCK) {
            Ok(1) => console.handle_byte(byte[0], board, &mut uart, &mut delay)?,
            Ok(_) => FreeRtos::delay_ms(1),
            Err(e) => {
                warn!("console read failed: {}", e);
                FreeRtos::delay_ms(10);
            }
        }

        board.drain_events(|event| log_sink.emit(&event));
        let dropped = board.events().dropped();
        if dropped != reported_drops {
            warn!("{} events dropped since boot", dropped);
            reported_drops = dropped;
        }

        let now = board.now();
        if now.saturating_sub(last_beat) >= config.heartbeat_interval_ms {
            heartbeat.toggle();
            last_beat = now;
        }
    }
}
